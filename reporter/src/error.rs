//! Error types for the reporter.

use std::path::PathBuf;

use degiro_broker::DegiroError;

/// All errors that can occur during a reporter run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read credentials file {path}: {source}")]
    CredentialsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Broker(#[from] DegiroError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            Error::Broker(DegiroError::Authentication(_)) => 3,
            Error::Broker(DegiroError::Request { .. }) => 4,
            _ => 1,
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Output { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
