//! Report rendering: CSV files and console tables.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use degiro::{COLUMNS, PortfolioSummary, PriceSeries, SummaryRow};

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn row_fields(row: &SummaryRow) -> [String; 8] {
    [
        row.product.clone(),
        row.symbol.clone(),
        row.quantity.to_string(),
        opt(row.price),
        row.currency.clone(),
        row.value.to_string(),
        opt(row.break_even_price),
        row.allocation_pct.map(|a| format!("{a:.2}")).unwrap_or_default(),
    ]
}

fn create(path: &Path) -> io::Result<BufWriter<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(fs::File::create(path)?))
}

/// Write the summary table as CSV with a header row.
pub fn write_portfolio_csv(path: &Path, summary: &PortfolioSummary) -> io::Result<()> {
    let mut writer = create(path)?;
    writeln!(writer, "{}", COLUMNS.map(csv_field).join(","))?;
    for row in &summary.rows {
        writeln!(writer, "{}", row_fields(row).map(|f| csv_field(&f)).join(","))?;
    }
    writer.flush()
}

/// Write a price series as `time,price` CSV.
pub fn write_series_csv(path: &Path, series: &PriceSeries) -> io::Result<()> {
    let mut writer = create(path)?;
    writeln!(writer, "time,price")?;
    for p in &series.points {
        writeln!(writer, "{},{}", p.time.format("%Y-%m-%d %H:%M:%S"), p.price)?;
    }
    writer.flush()
}

/// Aligned text table of the summary rows.
pub fn render_table(summary: &PortfolioSummary) -> String {
    let rows: Vec<[String; 8]> = summary.rows.iter().map(row_fields).collect();
    let mut widths = COLUMNS.map(str::len);
    for row in &rows {
        for (w, field) in widths.iter_mut().zip(row) {
            *w = (*w).max(field.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, fields: &[&str]| {
        let cells: Vec<String> = fields
            .iter()
            .zip(widths)
            .map(|(f, w)| format!("{f:<w$}"))
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    };
    line(&mut out, &COLUMNS);
    for row in &rows {
        let fields: Vec<&str> = row.iter().map(String::as_str).collect();
        line(&mut out, &fields);
    }
    out
}

/// One `CCY  : value` line per cash balance.
pub fn render_cash(cash: &BTreeMap<String, f64>) -> String {
    let mut out = String::new();
    for (currency, value) in cash {
        let _ = writeln!(out, "{currency:<5}: {value}");
    }
    out
}

/// Make a product name safe to use as a file name.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim().trim_matches('.');
    if stem.is_empty() {
        "product".into()
    } else {
        stem.to_string()
    }
}
