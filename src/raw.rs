//! The broker's attribute-list encoding.
//!
//! Every record in a snapshot arrives as an ordered list of
//! `{"name": ..., "value": ...}` pairs instead of a JSON object:
//!
//! ```json
//! [{"name": "id", "value": "332111"}, {"name": "size", "value": 3}, {"name": "price"}]
//! ```
//!
//! [`flatten`] turns that list into a [`Record`]. A pair without a `value`
//! key becomes `Value::Null`, which is kept distinct from an explicit `0`.

use serde_json::{Map, Value};

use crate::error::NormalizeError;

/// A flattened broker record: attribute name to attribute value.
pub type Record = Map<String, Value>;

/// Flatten a `[{name, value}, ...]` list into a [`Record`].
///
/// Names are assumed unique within one record; a repeated name keeps the
/// last value.
pub fn flatten(entries: &[Value]) -> Result<Record, NormalizeError> {
    let mut record = Record::new();
    for entry in entries {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| NormalizeError::missing("attribute", "name"))?;
        let value = entry.get("value").cloned().unwrap_or(Value::Null);
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

/// The `value` list of a snapshot section, e.g. `snapshot.portfolio.value`.
pub fn section<'a>(snapshot: &'a Value, name: &str) -> Result<&'a [Value], NormalizeError> {
    let section = snapshot
        .get(name)
        .ok_or_else(|| NormalizeError::missing("snapshot", name))?;
    list(section, name)
}

/// The `value` member of `node`, which must be a list.
pub(crate) fn list<'a>(node: &'a Value, field: &str) -> Result<&'a [Value], NormalizeError> {
    match node.get("value") {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) | None => Ok(&[]),
        Some(_) => Err(NormalizeError::UnexpectedKind {
            field: format!("{field}.value"),
            expected: "a list",
        }),
    }
}

/// Read a numeric attribute. Absent and `null` both read as `None`.
pub fn number(
    record: &Record,
    context: &'static str,
    field: &str,
) -> Result<Option<f64>, NormalizeError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| NormalizeError::NotANumber {
            context,
            field: field.to_string(),
        }),
    }
}

/// Read an identifier that may be sent either as a string or as a number.
pub fn ident(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a string attribute.
pub fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
