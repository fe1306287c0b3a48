//! Product metadata from search or product-info payloads.
//!
//! The broker returns product metadata in two envelopes:
//!
//! - search results: `{"products": [{...}, ...]}`
//! - product info: `{"data": {"<id>": {...}, ...}}`
//!
//! [`ProductSource`] tells the two apart up front; [`Product`] is the single
//! canonical record built from either.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ProductError;
use crate::raw;

/// Product fields as sent by the broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(deserialize_with = "ident")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub close_price_date: Option<String>,
    #[serde(default, deserialize_with = "opt_ident")]
    pub vwd_id: Option<String>,
    #[serde(default, deserialize_with = "opt_ident")]
    pub vwd_id_secondary: Option<String>,
    #[serde(default)]
    pub contract_size: Option<f64>,
}

/// Search-result envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub products: Vec<RawProduct>,
}

/// Product-info envelope, keyed by product id.
///
/// Entries keep payload order.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInfo {
    #[serde(deserialize_with = "entries_in_order")]
    pub data: Vec<(String, RawProduct)>,
}

/// The two accepted product payloads.
#[derive(Debug, Clone)]
pub enum ProductSource {
    Search(SearchResult),
    Info(ProductInfo),
}

impl ProductSource {
    /// Classify and decode a raw payload.
    pub fn from_value(value: Value) -> Result<Self, ProductError> {
        if value.get("products").is_some() {
            Ok(ProductSource::Search(serde_json::from_value(value)?))
        } else if value.get("data").is_some() {
            Ok(ProductSource::Info(serde_json::from_value(value)?))
        } else {
            Err(ProductError::UnrecognizedShape)
        }
    }

    /// All products in the payload.
    pub fn into_products(self) -> Vec<Product> {
        match self {
            ProductSource::Search(s) => s.products.into_iter().map(Product::from).collect(),
            ProductSource::Info(i) => i.data.into_iter().map(|(_, p)| Product::from(p)).collect(),
        }
    }
}

/// Canonical, immutable product record.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: String,
    name: String,
    symbol: Option<String>,
    currency: Option<String>,
    close_price: Option<f64>,
    close_date: Option<String>,
    streaming_id: Option<String>,
    contract_size: f64,
}

impl Product {
    /// Build a product from either payload, using its first entry.
    ///
    /// For the product-info shape "first" means first in payload order, not
    /// smallest id.
    pub fn from_value(value: Value) -> Result<Self, ProductError> {
        Self::try_from(ProductSource::from_value(value)?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn close_price(&self) -> Option<f64> {
        self.close_price
    }

    pub fn close_date(&self) -> Option<&str> {
        self.close_date.as_deref()
    }

    /// Identifier for the price-series endpoint.
    ///
    /// The primary id is used when it parses as an integer, the secondary id
    /// otherwise.
    pub fn streaming_id(&self) -> Option<&str> {
        self.streaming_id.as_deref()
    }

    pub fn contract_size(&self) -> f64 {
        self.contract_size
    }
}

impl TryFrom<ProductSource> for Product {
    type Error = ProductError;

    fn try_from(source: ProductSource) -> Result<Self, Self::Error> {
        let first = match source {
            ProductSource::Search(s) => s.products.into_iter().next(),
            ProductSource::Info(i) => i.data.into_iter().next().map(|(_, p)| p),
        };
        first.map(Product::from).ok_or(ProductError::Empty)
    }
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        let streaming_id = match raw.vwd_id {
            Some(primary) if primary.trim().parse::<i64>().is_ok() => Some(primary),
            _ => raw.vwd_id_secondary,
        };
        Product {
            id: raw.id,
            name: raw.name,
            symbol: raw.symbol,
            currency: raw.currency,
            close_price: raw.close_price,
            close_date: raw.close_price_date,
            streaming_id,
            contract_size: raw.contract_size.unwrap_or(1.0),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Product: {}", self.name)?;
        writeln!(f, "\tid: {}", self.id)?;
        writeln!(f, "\tsymbol: {}", self.symbol().unwrap_or("-"))?;
        match self.close_price {
            Some(p) => writeln!(f, "\tclose price: {p} {}", self.currency().unwrap_or(""))?,
            None => writeln!(f, "\tclose price: -")?,
        }
        writeln!(f, "\tclose date: {}", self.close_date().unwrap_or("-"))?;
        write!(f, "\tstreaming id: {}", self.streaming_id().unwrap_or("-"))
    }
}

fn entries_in_order<'de, D>(de: D) -> Result<Vec<(String, RawProduct)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Entries;

    impl<'de> Visitor<'de> for Entries {
        type Value = Vec<(String, RawProduct)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of products keyed by id")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    de.deserialize_map(Entries)
}

fn ident<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    let value = Value::deserialize(de)?;
    raw::ident(&value).ok_or_else(|| serde::de::Error::custom("expected a string or number id"))
}

fn opt_ident<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(raw::ident(&Value::deserialize(de)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search(vwd: Value, secondary: Option<&str>) -> Value {
        let mut p = json!({
            "id": 1, "name": "X", "symbol": "X", "currency": "USD",
            "closePrice": 10, "closePriceDate": "2021-01-01", "vwdId": vwd,
        });
        if let Some(s) = secondary {
            p["vwdIdSecondary"] = json!(s);
        }
        json!({"products": [p]})
    }

    #[test]
    fn search_result_with_integer_vwd_id() {
        let product = Product::from_value(search(json!("123"), None)).unwrap();
        assert_eq!(product.id(), "1");
        assert_eq!(product.name(), "X");
        assert_eq!(product.symbol(), Some("X"));
        assert_eq!(product.currency(), Some("USD"));
        assert_eq!(product.close_price(), Some(10.0));
        assert_eq!(product.close_date(), Some("2021-01-01"));
        assert_eq!(product.streaming_id(), Some("123"));
    }

    #[test]
    fn non_integer_vwd_id_falls_back_to_secondary() {
        let product = Product::from_value(search(json!("abc"), Some("999"))).unwrap();
        assert_eq!(product.streaming_id(), Some("999"));
    }

    #[test]
    fn numeric_vwd_id_is_accepted() {
        let product = Product::from_value(search(json!(350015372), Some("x"))).unwrap();
        assert_eq!(product.streaming_id(), Some("350015372"));
    }

    #[test]
    fn product_info_shape() {
        let payload = json!({"data": {"42": {
            "id": "42", "name": "Bond", "currency": "EUR",
            "vwdIdSecondary": "BOND.ID", "contractSize": 0.01,
        }}});
        let product = Product::from_value(payload).unwrap();
        assert_eq!(product.id(), "42");
        assert_eq!(product.symbol(), None);
        assert_eq!(product.streaming_id(), Some("BOND.ID"));
        assert_eq!(product.contract_size(), 0.01);
    }

    #[test]
    fn unrecognized_shape_fails() {
        let err = Product::from_value(json!({"items": []})).unwrap_err();
        assert!(matches!(err, ProductError::UnrecognizedShape));
    }

    #[test]
    fn empty_search_fails() {
        let err = Product::from_value(json!({"products": []})).unwrap_err();
        assert!(matches!(err, ProductError::Empty));
    }

    #[test]
    fn missing_name_is_a_decode_error() {
        let err = Product::from_value(json!({"products": [{"id": 1}]})).unwrap_err();
        assert!(matches!(err, ProductError::Decode(_)));
    }

    #[test]
    fn into_products_keeps_every_entry() {
        let payload = json!({"data": {
            "1": {"id": 1, "name": "A"},
            "2": {"id": 2, "name": "B"},
        }});
        let products = ProductSource::from_value(payload).unwrap().into_products();
        assert_eq!(products.len(), 2);
    }

    #[test]
    fn info_shape_takes_first_entry_in_payload_order() {
        let payload = json!({"data": {
            "9": {"id": 9, "name": "Nine"},
            "10": {"id": 10, "name": "Ten"},
        }});
        let product = Product::from_value(payload.clone()).unwrap();
        assert_eq!(product.id(), "9");

        let ids: Vec<String> = ProductSource::from_value(payload)
            .unwrap()
            .into_products()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, ["9", "10"]);
    }

    #[test]
    fn display_lists_fields() {
        let product = Product::from_value(search(json!("123"), None)).unwrap();
        let text = product.to_string();
        assert!(text.starts_with("Product: X"));
        assert!(text.contains("close price: 10 USD"));
        assert!(text.contains("streaming id: 123"));
    }
}
