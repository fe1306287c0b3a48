//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use degiro_broker::Endpoints;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: EndpointConfig,
    pub report: ReportConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    #[serde(flatten)]
    pub urls: Endpoints,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            urls: Endpoints::default(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub base_currency: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("logs"),
            base_currency: "EUR".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: degiro_broker::DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Config = toml::from_str(&contents)?;
        // Cash fund keys are upper-case currency codes.
        config.report.base_currency.make_ascii_uppercase();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        for (key, url) in [
            ("trader_url", &self.endpoints.urls.trader_url),
            ("charting_url", &self.endpoints.urls.charting_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!("{key} must be an http(s) URL")));
            }
        }
        if self.endpoints.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        if self.search.limit == 0 {
            return Err(Error::Config("search limit must be >= 1".into()));
        }
        let ccy = &self.report.base_currency;
        if ccy.len() != 3 || !ccy.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Config(
                "base_currency must be a three-letter code".into(),
            ));
        }
        Ok(())
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints.urls.clone()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.endpoints.timeout_secs)
    }

    /// Full path to an output file.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.report.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use degiro_broker::endpoints::{DEFAULT_CHARTING_URL, DEFAULT_TRADER_URL};

    fn example_toml() -> &'static str {
        r#"
[endpoints]
trader_url = "https://trader.degiro.nl"
timeout_secs = 10

[report]
output_dir = "./out"
base_currency = "USD"

[search]
limit = 5
"#
    }

    #[test]
    fn parse_example_config() {
        let config: Config = toml::from_str(example_toml()).unwrap();
        assert_eq!(config.endpoints.timeout_secs, 10);
        assert_eq!(config.endpoints.urls.charting_url, DEFAULT_CHARTING_URL);
        assert_eq!(config.report.base_currency, "USD");
        assert_eq!(config.search.limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.endpoints.urls.trader_url, DEFAULT_TRADER_URL);
        assert_eq!(config.report.output_dir, PathBuf::from("logs"));
        assert_eq!(config.search.limit, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_catches_bad_url() {
        let mut config = Config::default();
        config.endpoints.urls.trader_url = "ftp://x".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_timeout() {
        let mut config = Config::default();
        config.endpoints.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_zero_limit() {
        let mut config = Config::default();
        config.search.limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_bad_currency() {
        let mut config = Config::default();
        config.report.base_currency = "EURO".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, example_toml()).unwrap();
        let config = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.output_path("portfolio.csv"), PathBuf::from("./out/portfolio.csv"));
    }

    #[test]
    fn load_uppercases_base_currency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[report]\nbase_currency = \"usd\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.report.base_currency, "USD");
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
