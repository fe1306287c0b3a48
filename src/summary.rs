//! Portfolio summary table and totals.

use std::collections::BTreeMap;

use crate::normalize::{CashFund, Portfolio};

/// Column headers of the summary table, in row order.
pub const COLUMNS: [&str; 8] = [
    "Product", "Symbol", "Qty", "Price", "Curr.", "Value", "BEP", "alloc(%)",
];

/// One tradable position in the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub product_id: String,
    pub product: String,
    pub symbol: String,
    pub quantity: f64,
    pub price: Option<f64>,
    pub currency: String,
    pub value: f64,
    pub break_even_price: Option<f64>,
    /// Share of the total `PRODUCT` value, in percent. `None` when that
    /// total is zero.
    pub allocation_pct: Option<f64>,
}

/// Summary of a portfolio plus its cash balances.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub rows: Vec<SummaryRow>,
    /// Sum of all `PRODUCT` position values.
    pub product_total: f64,
    /// Cash balances by currency, unconverted.
    pub cash: BTreeMap<String, f64>,
    pub base_currency: String,
    /// All position values plus the cash balance in `base_currency`.
    ///
    /// Balances in other currencies are not converted and not included.
    pub grand_total: f64,
}

/// Build the summary table.
///
/// Absent values count as zero in totals.
pub fn summarize(
    portfolio: &Portfolio,
    cash_funds: &BTreeMap<String, CashFund>,
    base_currency: &str,
) -> PortfolioSummary {
    let product_total: f64 = portfolio
        .products()
        .map(|(_, p)| p.value.unwrap_or(0.0))
        .sum();

    let rows = portfolio
        .products()
        .map(|(id, p)| {
            let value = p.value.unwrap_or(0.0);
            SummaryRow {
                product_id: id.clone(),
                product: p.name().unwrap_or_default().to_string(),
                symbol: p.symbol().unwrap_or_default().to_string(),
                quantity: p.size,
                price: p.price,
                currency: p.currency().unwrap_or_default().to_string(),
                value,
                break_even_price: p.break_even_price,
                allocation_pct: allocation(value, product_total),
            }
        })
        .collect();

    let cash: BTreeMap<String, f64> = cash_funds
        .iter()
        .map(|(ccy, fund)| (ccy.clone(), fund.value.unwrap_or(0.0)))
        .collect();

    let positions_total: f64 = portfolio
        .iter()
        .map(|(_, _, p)| p.value.unwrap_or(0.0))
        .sum();
    let base_cash = cash.get(base_currency).copied().unwrap_or(0.0);

    PortfolioSummary {
        rows,
        product_total,
        cash,
        base_currency: base_currency.to_string(),
        grand_total: positions_total + base_cash,
    }
}

fn allocation(value: f64, total: f64) -> Option<f64> {
    if total == 0.0 {
        None
    } else {
        Some(value / total * 100.0)
    }
}
