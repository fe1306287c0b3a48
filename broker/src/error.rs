//! Broker error types.

use degiro::{NormalizeError, ProductError, SeriesError};

/// Errors that can occur while talking to the broker.
#[derive(Debug, thiserror::Error)]
pub enum DegiroError {
    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("{operation} failed with HTTP status {status}")]
    Request { operation: &'static str, status: u16 },

    #[error("{operation}: response has no `{field}`")]
    Lookup {
        operation: &'static str,
        field: &'static str,
    },

    #[error("connection error during {operation}: {message}")]
    Connection {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: response is not valid JSON: {source}")]
    Decode {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[error("format error: {0}")]
    Format(#[from] ProductError),

    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("price series error: {0}")]
    Series(#[from] SeriesError),
}

impl DegiroError {
    /// HTTP status of a failed request, if that is what this error is.
    pub fn status(&self) -> Option<u16> {
        match self {
            DegiroError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_names_operation_and_status() {
        let err = DegiroError::Request {
            operation: "get data",
            status: 401,
        };
        assert_eq!(err.to_string(), "get data failed with HTTP status 401");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn lookup_error_display() {
        let err = DegiroError::Lookup {
            operation: "get account id",
            field: "data.intAccount",
        };
        assert!(err.to_string().contains("data.intAccount"));
        assert_eq!(err.status(), None);
    }
}
