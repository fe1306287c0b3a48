//! Snapshot normalization: cash funds and portfolio positions.
//!
//! A raw snapshot (see [`section`](crate::raw::section)) carries both the
//! portfolio rows and the cash funds in the attribute-list encoding. This
//! module flattens them, groups positions by type and id, and enriches
//! tradable positions with product metadata fetched in one batch.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::raw::{self, Record};

/// Position type of tradable instruments.
pub const PRODUCT: &str = "PRODUCT";

/// One non-zero cash balance.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFund {
    pub currency: String,
    /// `None` when the broker sent the attribute without a value.
    pub value: Option<f64>,
    /// All attributes except `currencyCode`.
    pub attributes: Record,
}

/// Extract cash balances keyed by currency code.
///
/// `currencyCode` is consumed as the key; entries whose `value` is zero are
/// dropped.
pub fn extract_cash_funds(snapshot: &Value) -> Result<BTreeMap<String, CashFund>, NormalizeError> {
    let mut funds = BTreeMap::new();
    for entry in raw::section(snapshot, "cashFunds")? {
        let mut attributes = raw::flatten(raw::list(entry, "cashFunds")?)?;
        let currency = attributes
            .remove("currencyCode")
            .as_ref()
            .and_then(raw::ident)
            .ok_or_else(|| NormalizeError::missing("cash fund", "currencyCode"))?;
        let value = raw::number(&attributes, "cash fund", "value")?;
        if value == Some(0.0) {
            continue;
        }
        funds.insert(
            currency.clone(),
            CashFund {
                currency,
                value,
                attributes,
            },
        );
    }
    Ok(funds)
}

/// A held position, merged with its product metadata when it has any.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Quantity in underlying units (raw size times contract size).
    pub size: f64,
    pub price: Option<f64>,
    pub value: Option<f64>,
    pub break_even_price: Option<f64>,
    pub contract_size: f64,
    /// Every attribute of the row and of its product info, minus the
    /// grouping keys `positionType` and `id`.
    pub attributes: Record,
}

impl Position {
    /// Build the final position from a flattened row and optional product info.
    ///
    /// The raw size is read before the info is merged, and scaled by the
    /// contract size exactly once.
    fn merge(mut row: Record, info: Option<Record>) -> Result<Self, NormalizeError> {
        let raw_size = raw::number(&row, "portfolio row", "size")?
            .ok_or_else(|| NormalizeError::missing("portfolio row", "size"))?;

        let contract_size = match &info {
            Some(info) => raw::number(info, "product info", "contractSize")?.unwrap_or(1.0),
            None => 1.0,
        };

        if let Some(info) = info {
            row.extend(info);
        }
        let size = raw_size * contract_size;
        row.insert("size".into(), Value::from(size));

        Ok(Position {
            size,
            price: raw::number(&row, "portfolio row", "price")?,
            value: raw::number(&row, "portfolio row", "value")?,
            break_even_price: raw::number(&row, "portfolio row", "breakEvenPrice")?,
            contract_size,
            attributes: row,
        })
    }

    pub fn name(&self) -> Option<&str> {
        raw::text(&self.attributes, "name")
    }

    pub fn symbol(&self) -> Option<&str> {
        raw::text(&self.attributes, "symbol")
    }

    pub fn currency(&self) -> Option<&str> {
        raw::text(&self.attributes, "currency")
    }
}

/// Positions grouped by position type, then by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    groups: BTreeMap<String, BTreeMap<String, Position>>,
}

impl Portfolio {
    /// Positions of one type (`PRODUCT`, `CASH`, ...).
    pub fn group(&self, position_type: &str) -> Option<&BTreeMap<String, Position>> {
        self.groups.get(position_type)
    }

    /// Tradable positions keyed by product id.
    pub fn products(&self) -> impl Iterator<Item = (&String, &Position)> {
        self.group(PRODUCT).into_iter().flat_map(|g| g.iter())
    }

    /// All position types present.
    pub fn position_types(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Every position with its type and id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Position)> {
        self.groups.iter().flat_map(|(ty, group)| {
            group
                .iter()
                .map(move |(id, pos)| (ty.as_str(), id.as_str(), pos))
        })
    }

    /// Number of positions across all types.
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract held positions from a snapshot.
///
/// Rows with zero size (closed positions the broker still reports) are
/// dropped. `fetch_info` is called at most once, with the ids of every
/// `PRODUCT` position, and must return a product-info payload
/// (`{"data": {id: {...}}}`). It is not called when there are no products.
pub fn extract_portfolio<F, E>(snapshot: &Value, fetch_info: F) -> Result<Portfolio, E>
where
    F: FnOnce(&[String]) -> Result<Value, E>,
    E: From<NormalizeError>,
{
    let mut rows: BTreeMap<String, BTreeMap<String, Record>> = BTreeMap::new();

    for entry in raw::section(snapshot, "portfolio")? {
        let mut row = raw::flatten(raw::list(entry, "portfolio")?)?;
        let size = raw::number(&row, "portfolio row", "size")?
            .ok_or_else(|| NormalizeError::missing("portfolio row", "size"))?;
        if size == 0.0 {
            continue;
        }

        let position_type = row
            .remove("positionType")
            .as_ref()
            .and_then(raw::ident)
            .ok_or_else(|| NormalizeError::missing("portfolio row", "positionType"))?;
        let id = row
            .remove("id")
            .as_ref()
            .and_then(raw::ident)
            .ok_or_else(|| NormalizeError::missing("portfolio row", "id"))?;

        rows.entry(position_type).or_default().insert(id, row);
    }

    let product_ids: Vec<String> = rows
        .get(PRODUCT)
        .map(|g| g.keys().cloned().collect())
        .unwrap_or_default();

    let mut infos = if product_ids.is_empty() {
        FxHashMap::default()
    } else {
        index_product_info(&fetch_info(&product_ids)?)?
    };

    let mut groups = BTreeMap::new();
    for (position_type, group) in rows {
        let mut positions = BTreeMap::new();
        for (id, row) in group {
            let info = if position_type == PRODUCT {
                infos.remove(&id)
            } else {
                None
            };
            positions.insert(id, Position::merge(row, info)?);
        }
        groups.insert(position_type, positions);
    }

    Ok(Portfolio { groups })
}

/// Index a product-info payload by id, dropping each entry's own `id`.
fn index_product_info(payload: &Value) -> Result<FxHashMap<String, Record>, NormalizeError> {
    let data = payload
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| NormalizeError::missing("product info", "data"))?;

    let mut index = FxHashMap::default();
    for (id, info) in data {
        let Value::Object(info) = info else {
            return Err(NormalizeError::UnexpectedKind {
                field: format!("data.{id}"),
                expected: "an object",
            });
        };
        let mut info = info.clone();
        info.remove("id");
        index.insert(id.clone(), info);
    }
    Ok(index)
}
