//! Errors raised while normalizing broker payloads.

/// Failure to turn a raw `{name, value}` payload into flat records.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("missing field `{field}` in {context}")]
    MissingField {
        context: &'static str,
        field: String,
    },

    #[error("field `{field}` in {context} is not a number")]
    NotANumber {
        context: &'static str,
        field: String,
    },

    #[error("expected {expected} at `{field}`")]
    UnexpectedKind {
        field: String,
        expected: &'static str,
    },
}

impl NormalizeError {
    pub(crate) fn missing(context: &'static str, field: impl Into<String>) -> Self {
        NormalizeError::MissingField {
            context,
            field: field.into(),
        }
    }
}

/// Failure to build a [`Product`](crate::Product) from a raw payload.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error(
        "unrecognized product payload: expected a search result (`products`) \
         or a product-info result (`data`)"
    )]
    UnrecognizedShape,

    #[error("product payload contains no products")]
    Empty,

    #[error("invalid product payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure to parse a historic price series.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("response contains no price series")]
    NoPriceSeries,

    #[error("invalid series time code `{0}`")]
    TimeCode(String),

    #[error("invalid price point at index {index}: {reason}")]
    Point { index: usize, reason: &'static str },
}
