//! Mock transport for testing: canned responses, recorded requests.
//!
//! Use this in tests to drive a session without network calls.
//!
//! ```
//! use degiro_broker::mock::MockTransport;
//! use degiro_broker::transport::HttpResponse;
//! use serde_json::json;
//!
//! let transport = MockTransport::builder()
//!     .with_login("TOKEN", 1234)
//!     .respond("/v5/update/", HttpResponse::json(200, &json!({"portfolio": {"value": []}})))
//!     .build();
//! ```

use std::sync::Mutex;

use serde_json::json;

use crate::error::DegiroError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

struct Route {
    pattern: String,
    method: Option<Method>,
    response: Result<HttpResponse, String>,
}

/// Builder for `MockTransport`.
pub struct MockTransportBuilder {
    routes: Vec<Route>,
}

impl MockTransportBuilder {
    /// Answer any request whose URL contains `pattern`.
    pub fn respond(mut self, pattern: &str, response: HttpResponse) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            method: None,
            response: Ok(response),
        });
        self
    }

    /// Answer only requests with the given method.
    pub fn respond_to(mut self, method: Method, pattern: &str, response: HttpResponse) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            method: Some(method),
            response: Ok(response),
        });
        self
    }

    /// Fail requests matching `pattern` at the transport level.
    pub fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            method: None,
            response: Err(message.to_string()),
        });
        self
    }

    /// Successful login with `token`, account id lookup, client id lookup
    /// and logout.
    pub fn with_login(self, token: &str, account_id: i64) -> Self {
        self.respond(
            "/login/secure/login",
            HttpResponse::json(200, &json!({"status": 0}))
                .with_cookie(format!("JSESSIONID={token}; Path=/; HttpOnly")),
        )
        .respond(
            "/pa/secure/client",
            HttpResponse::json(200, &json!({"data": {"intAccount": account_id, "id": 1}})),
        )
        .respond(
            "/login/secure/config",
            HttpResponse::json(200, &json!({"data": {"clientId": account_id + 1}})),
        )
        .respond("/trading/secure/logout", HttpResponse::new(200, ""))
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            routes: self.routes,
            requests: Mutex::new(Vec::new()),
        }
    }
}

/// A transport that replays canned responses and records every request.
///
/// Routes are matched in insertion order; unmatched requests get a 404.
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder { routes: Vec::new() }
    }

    /// All requests executed so far (for assertion in tests).
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests whose URL contains `pattern`.
    pub fn requests_to(&self, pattern: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(pattern))
            .collect()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, DegiroError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let route = self.routes.iter().find(|r| {
            request.url.contains(&r.pattern) && r.method.is_none_or(|m| m == request.method)
        });
        match route {
            Some(Route {
                response: Ok(resp), ..
            }) => Ok(resp.clone()),
            Some(Route {
                response: Err(message),
                ..
            }) => Err(DegiroError::Connection {
                operation: request.operation,
                message: message.clone(),
            }),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}
