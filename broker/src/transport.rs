//! HTTP exchange types and the transport seam.
//!
//! Every endpoint call is built as an [`HttpRequest`] and handed to a
//! [`Transport`]. The session never touches the network directly, so tests
//! can swap in [`MockTransport`](crate::mock::MockTransport).

use std::fmt;

use serde_json::Value;

use crate::error::DegiroError;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request to one broker endpoint.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    /// Label used in logs and errors (e.g. "get data").
    pub operation: &'static str,
    pub method: Method,
    pub url: String,
    /// Query pairs in order; repeated keys are allowed.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(operation: &'static str, url: impl Into<String>) -> Self {
        Self::new(operation, Method::Get, url.into())
    }

    pub fn post(operation: &'static str, url: impl Into<String>) -> Self {
        Self::new(operation, Method::Post, url.into())
    }

    fn new(operation: &'static str, method: Method, url: String) -> Self {
        Self {
            operation,
            method,
            url,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach a JSON body and the matching content type.
    pub fn json(self, body: &Value) -> Self {
        let mut req = self.header("content-type", "application/json");
        req.body = Some(body.to_string());
        req
    }

    /// First query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First header value for `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Bodies may carry credentials.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("operation", &self.operation)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("body_len", &self.body.as_ref().map(String::len))
            .finish_non_exhaustive()
    }
}

/// A response as seen by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Every `Set-Cookie` header, in order.
    pub cookies: Vec<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            cookies: Vec::new(),
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.push(cookie.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn parse(&self, operation: &'static str) -> Result<Value, DegiroError> {
        serde_json::from_str(&self.body).map_err(|source| DegiroError::Decode { operation, source })
    }
}

/// Executes one HTTP exchange. Blocking; no retries.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, DegiroError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, DegiroError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, DegiroError> {
        (**self).execute(request)
    }
}
