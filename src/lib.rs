//! # degiro
//!
//! Normalization layer for the DEGIRO trading API.
//!
//! The broker encodes records as ordered `[{name, value}, ...]` lists nested
//! inside a combined snapshot. This crate turns those payloads into flat,
//! typed records without doing any I/O itself:
//!
//! - [`raw::flatten`]: attribute list to [`Record`]
//! - [`extract_cash_funds`]: non-zero cash balances keyed by currency
//! - [`extract_portfolio`]: held positions grouped by type and product id,
//!   merged with product info and scaled by contract size
//! - [`summarize`]: allocation table and totals
//! - [`Product`]: canonical product record from a search or info payload
//! - [`PriceSeries`]: decoded historic prices for an [`Interval`]
//!
//! Network access lives in the `degiro-broker` crate.
//!
//! ## Quick Start
//!
//! ```
//! use degiro::{extract_cash_funds, NormalizeError};
//! use serde_json::json;
//!
//! let snapshot = json!({"cashFunds": {"value": [
//!     {"value": [{"name": "currencyCode", "value": "EUR"}, {"name": "value", "value": 100}]},
//!     {"value": [{"name": "currencyCode", "value": "USD"}, {"name": "value", "value": 0}]},
//! ]}});
//!
//! let funds = extract_cash_funds(&snapshot)?;
//! assert_eq!(funds.len(), 1);
//! assert_eq!(funds["EUR"].value, Some(100.0));
//! # Ok::<(), NormalizeError>(())
//! ```

pub mod error;
pub mod interval;
pub mod normalize;
pub mod product;
pub mod raw;
pub mod series;
pub mod summary;

pub use error::{NormalizeError, ProductError, SeriesError};
pub use interval::{Interval, ParseIntervalError};
pub use normalize::{CashFund, PRODUCT, Portfolio, Position, extract_cash_funds, extract_portfolio};
pub use product::{Product, ProductSource, RawProduct};
pub use raw::Record;
pub use series::{PricePoint, PriceSeries};
pub use summary::{COLUMNS, PortfolioSummary, SummaryRow, summarize};
