//! Subcommands run inside an open session.

use std::fs;
use std::io::Write;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use degiro::Interval;
use degiro_broker::{Session, Transport};
use log::{info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::report;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Portfolio summary table and cash balances
    Portfolio,

    /// Search products by name, symbol or ISIN
    Search {
        text: String,

        /// Number of results (defaults to the configured limit)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Product details for one or more product ids
    Info {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Price history of the best search match
    Price {
        text: String,

        /// day, week, month, 3m, 6m, year, 3y, 5y or all
        #[arg(long, default_value = "year")]
        interval: Interval,
    },

    /// Dump the raw account snapshot as JSON
    Snapshot,
}

/// Run `command`, writing human-readable output to `out`.
pub fn execute<T, W>(
    session: &mut Session<T>,
    config: &Config,
    command: &Command,
    out: &mut W,
) -> Result<()>
where
    T: Transport,
    W: Write,
{
    match command {
        Command::Portfolio => portfolio(session, config, out),
        Command::Search { text, limit } => {
            search(session, text, limit.unwrap_or(config.search.limit), out)
        }
        Command::Info { ids } => product_info(session, ids, out),
        Command::Price { text, interval } => price(session, config, text, *interval, out),
        Command::Snapshot => snapshot(session, config),
    }
}

fn console(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .map_err(Error::output("<stdout>"))
}

pub fn portfolio<T: Transport, W: Write>(
    session: &mut Session<T>,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    let base = &config.report.base_currency;
    let (summary, _) = session.portfolio_summary(base)?;
    if !summary.cash.contains_key(base) {
        warn!("No {base} cash fund; grand total counts positions only");
    }

    let path = config.output_path("portfolio.csv");
    report::write_portfolio_csv(&path, &summary).map_err(Error::output(&path))?;
    info!("Wrote {} rows to {}", summary.rows.len(), path.display());

    console(out, &report::render_table(&summary))?;
    console(out, "\nCash funds:\n")?;
    console(out, &report::render_cash(&summary.cash))?;
    console(
        out,
        &format!(
            "\nProducts: {:.2}  Total: {:.2} {}\n",
            summary.product_total, summary.grand_total, summary.base_currency
        ),
    )
}

pub fn search<T: Transport, W: Write>(
    session: &mut Session<T>,
    text: &str,
    limit: u32,
    out: &mut W,
) -> Result<()> {
    let payload = session.search(text, limit)?;
    // No hits: the broker leaves out the `products` key.
    let products = match payload.get("products") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(_) => degiro::ProductSource::from_value(payload)
            .map_err(degiro_broker::DegiroError::from)?
            .into_products(),
    };
    if products.is_empty() {
        return console(out, &format!("No products match '{text}'\n"));
    }
    for product in &products {
        console(out, &format!("{product}\n"))?;
    }
    Ok(())
}

pub fn product_info<T: Transport, W: Write>(
    session: &mut Session<T>,
    ids: &[String],
    out: &mut W,
) -> Result<()> {
    for product in session.products(ids)? {
        console(out, &format!("{product}\n"))?;
    }
    Ok(())
}

pub fn price<T: Transport, W: Write>(
    session: &mut Session<T>,
    config: &Config,
    text: &str,
    interval: Interval,
    out: &mut W,
) -> Result<()> {
    let product = session.search_product(text)?;
    let series = session.historic_price(&product, interval)?;

    let path = config.output_path(&format!("{}.csv", report::file_stem(product.name())));
    report::write_series_csv(&path, &series).map_err(Error::output(&path))?;
    info!("Wrote {} price points to {}", series.points.len(), path.display());

    console(out, &format!("{product}\n"))?;
    match (series.min(), series.max()) {
        (Some(min), Some(max)) => console(
            out,
            &format!(
                "{interval}: min {} at {}, max {} at {}\n",
                min.price, min.time, max.price, max.time
            ),
        ),
        _ => console(out, &format!("{interval}: no prices\n")),
    }
}

/// Snapshot file contents: the raw payload with fetch metadata.
#[derive(Debug, Serialize)]
struct SnapshotFile<'a> {
    fetched_at: DateTime<Utc>,
    account: i64,
    data: &'a serde_json::Value,
}

pub fn snapshot<T: Transport>(session: &mut Session<T>, config: &Config) -> Result<()> {
    let account = session.account_id();
    let data = session.snapshot()?;
    let file = SnapshotFile {
        fetched_at: Utc::now(),
        account,
        data,
    };
    let json = serde_json::to_string_pretty(&file)?;

    let path = config.output_path("snapshot.json");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(Error::output(parent))?;
    }
    fs::write(&path, json).map_err(Error::output(&path))?;
    info!("Wrote snapshot to {}", path.display());
    Ok(())
}
