//! Raw endpoint calls.
//!
//! [`DegiroClient`] holds no session state: every authenticated call takes
//! the [`SessionContext`] explicitly. Each call checks the HTTP status and
//! fails with [`DegiroError::Request`] on anything but 2xx. There are no
//! retries. Every trader-host call after login sends the `JSESSIONID`
//! cookie; the charting host gets the client id instead.

use std::fmt;

use degiro::Interval;
use log::{debug, info, warn};
use serde_json::{Value, json};

use crate::credentials::Credentials;
use crate::endpoints::Endpoints;
use crate::error::DegiroError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Server-issued session token (the `JSESSIONID` cookie value).
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the token from `Set-Cookie` headers: first cookie, text
    /// before the first `;`, value after the first `=`.
    pub fn from_cookies(cookies: &[String]) -> Option<Self> {
        let pair = cookies.first()?.split(';').next()?;
        let (_, value) = pair.split_once('=')?;
        let value = value.trim();
        (!value.is_empty()).then(|| Self(value.to_string()))
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Identity of an authenticated session, passed to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub token: SessionToken,
    pub account_id: i64,
    /// Only needed for price history; fetched on demand.
    pub client_id: Option<i64>,
}

/// Stateless endpoint wrapper over a [`Transport`].
pub struct DegiroClient<T: Transport> {
    transport: T,
    endpoints: Endpoints,
}

impl<T: Transport> DegiroClient<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DegiroError> {
        let resp = self.transport.execute(request)?;
        debug!("{}: status {}", request.operation, resp.status);
        if !resp.is_success() {
            return Err(DegiroError::Request {
                operation: request.operation,
                status: resp.status,
            });
        }
        Ok(resp)
    }

    fn send_json(&self, request: &HttpRequest) -> Result<Value, DegiroError> {
        self.send(request)?.parse(request.operation)
    }

    /// Post credentials and return the session token.
    pub fn login(&self, credentials: &Credentials) -> Result<SessionToken, DegiroError> {
        let body = json!({
            "username": credentials.username(),
            "password": credentials.password(),
            "isPassCodeReset": false,
            "isRedirectToMobile": false,
        });
        let request = HttpRequest::post("login", self.endpoints.login()).json(&body);

        let resp = self.transport.execute(&request)?;
        info!("Login: status {}", resp.status);
        if !resp.is_success() {
            return Err(DegiroError::Authentication(format!(
                "login returned status {}",
                resp.status
            )));
        }
        SessionToken::from_cookies(&resp.cookies)
            .ok_or_else(|| DegiroError::Authentication("login response set no session cookie".into()))
    }

    /// Integer account id (`data.intAccount` of the client endpoint).
    pub fn account_id(&self, token: &SessionToken) -> Result<i64, DegiroError> {
        let request = HttpRequest::get("get account id", self.endpoints.client())
            .query("sessionId", token.as_str());
        let request = with_cookie(request, token);
        let data = self.send_json(&request)?;
        let id = lookup_i64(&data, "/data/intAccount").ok_or(DegiroError::Lookup {
            operation: request.operation,
            field: "data.intAccount",
        })?;
        info!("Account id: {id}");
        Ok(id)
    }

    /// Client id (`data.clientId` of the config endpoint), used as the
    /// charting user token.
    pub fn client_id(&self, token: &SessionToken) -> Result<i64, DegiroError> {
        let request = with_cookie(
            HttpRequest::get("get client id", self.endpoints.config()),
            token,
        );
        let data = self.send_json(&request)?;
        lookup_i64(&data, "/data/clientId").ok_or(DegiroError::Lookup {
            operation: request.operation,
            field: "data.clientId",
        })
    }

    /// Combined snapshot: orders, historical orders, transactions,
    /// portfolio, total portfolio, alerts and cash funds.
    pub fn update(&self, ctx: &SessionContext) -> Result<Value, DegiroError> {
        let mut request = HttpRequest::get(
            "get data",
            self.endpoints.update(ctx.account_id, ctx.token.as_str()),
        );
        for section in [
            "portfolio",
            "totalPortfolio",
            "orders",
            "historicalOrders",
            "transactions",
            "alerts",
            "cashFunds",
        ] {
            request = request.query(section, 0);
        }
        let request = request
            .query("intAccount", ctx.account_id)
            .query("sessionId", ctx.token.as_str());
        let request = with_cookie(request, &ctx.token);
        let data = self.send_json(&request)?;
        info!("Fetched account snapshot");
        Ok(data)
    }

    /// Bulk product info by id.
    pub fn product_info(&self, ctx: &SessionContext, ids: &[String]) -> Result<Value, DegiroError> {
        let request = HttpRequest::post("get product info", self.endpoints.product_info())
            .query("intAccount", ctx.account_id)
            .query("sessionId", ctx.token.as_str())
            .json(&json!(ids));
        let request = with_cookie(request, &ctx.token);
        debug!("Requesting info for {} products", ids.len());
        self.send_json(&request)
    }

    /// Free-text product search, limited to `limit` results server-side.
    pub fn search(&self, ctx: &SessionContext, text: &str, limit: u32) -> Result<Value, DegiroError> {
        let request = HttpRequest::get("search product", self.endpoints.product_search())
            .query("intAccount", ctx.account_id)
            .query("sessionId", ctx.token.as_str())
            .query("searchText", text)
            .query("limit", limit);
        self.send_json(&with_cookie(request, &ctx.token))
    }

    /// Raw price history for a streaming id.
    pub fn historic_price(
        &self,
        client_id: i64,
        streaming_id: &str,
        interval: Interval,
    ) -> Result<Value, DegiroError> {
        let request = HttpRequest::get("get historic price", self.endpoints.charting())
            .query("requestid", 1)
            .query("period", interval.code())
            .query("resolution", interval.resolution())
            .query("series", format!("issueid:{streaming_id}"))
            .query("series", format!("price:issueid:{streaming_id}"))
            .query("format", "json")
            .query("userToken", client_id)
            .query("tz", "Europe/Amsterdam")
            .query("culture", "en-US");
        self.send_json(&request)
    }

    /// Invalidate the session server-side.
    pub fn logout(&self, ctx: &SessionContext) -> Result<(), DegiroError> {
        let request = HttpRequest::get("logout", self.endpoints.logout(ctx.token.as_str()))
            .query("intAccount", ctx.account_id)
            .query("sessionId", ctx.token.as_str());
        let request = with_cookie(request, &ctx.token);
        match self.send(&request) {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!("Logout failed: {e}");
                Err(e)
            }
        }
    }
}

/// Trader-host calls after login carry the session cookie.
fn with_cookie(request: HttpRequest, token: &SessionToken) -> HttpRequest {
    request.header("Cookie", format!("JSESSIONID={}", token.as_str()))
}

fn lookup_i64(data: &Value, pointer: &str) -> Option<i64> {
    let value = data.pointer(pointer)?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
