//! Endpoint URLs.
//!
//! The session token travels differently per endpoint: as a `;jsessionid=`
//! path parameter, as a `sessionId` query parameter, or as a cookie header.
//! The URL builders here cover the path part; the query and header parts are
//! added by [`DegiroClient`](crate::client::DegiroClient).

use serde::Deserialize;

pub const DEFAULT_TRADER_URL: &str = "https://trader.degiro.nl";
pub const DEFAULT_CHARTING_URL: &str = "https://charting.vwdservices.com/hchart/v1/deGiro/data.js";

/// Base URLs of the trading and charting services.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub trader_url: String,
    pub charting_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            trader_url: DEFAULT_TRADER_URL.into(),
            charting_url: DEFAULT_CHARTING_URL.into(),
        }
    }
}

impl Endpoints {
    fn trader(&self, path: &str) -> String {
        format!("{}{path}", self.trader_url.trim_end_matches('/'))
    }

    pub fn login(&self) -> String {
        self.trader("/login/secure/login")
    }

    pub fn client(&self) -> String {
        self.trader("/pa/secure/client")
    }

    pub fn config(&self) -> String {
        self.trader("/login/secure/config")
    }

    pub fn update(&self, account_id: i64, token: &str) -> String {
        self.trader(&format!(
            "/trading/secure/v5/update/{account_id};jsessionid={token}"
        ))
    }

    pub fn product_info(&self) -> String {
        self.trader("/product_search/secure/v5/products/info")
    }

    pub fn product_search(&self) -> String {
        self.trader("/product_search/secure/v5/products/lookup")
    }

    pub fn logout(&self, token: &str) -> String {
        self.trader(&format!("/trading/secure/logout;jsessionid={token}"))
    }

    pub fn charting(&self) -> &str {
        &self.charting_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls() {
        let e = Endpoints::default();
        assert_eq!(e.login(), "https://trader.degiro.nl/login/secure/login");
        assert_eq!(
            e.update(123, "abc"),
            "https://trader.degiro.nl/trading/secure/v5/update/123;jsessionid=abc"
        );
        assert_eq!(
            e.logout("abc"),
            "https://trader.degiro.nl/trading/secure/logout;jsessionid=abc"
        );
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let e = Endpoints {
            trader_url: "http://localhost:8080/".into(),
            ..Endpoints::default()
        };
        assert_eq!(e.client(), "http://localhost:8080/pa/secure/client");
    }

    #[test]
    fn partial_deserialize_keeps_defaults() {
        let e: Endpoints = serde_json::from_str(r#"{"trader_url": "http://x"}"#).unwrap();
        assert_eq!(e.trader_url, "http://x");
        assert_eq!(e.charting_url, DEFAULT_CHARTING_URL);
    }
}
