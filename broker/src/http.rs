//! Blocking HTTP transport over reqwest.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::SET_COOKIE;

use crate::error::DegiroError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Blocking reqwest client. One connection pool for the whole session.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DegiroError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DegiroError::Connection {
                operation: "build http client",
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, DegiroError> {
        let operation = request.operation;
        let connection = |e: reqwest::Error| DegiroError::Connection {
            operation,
            message: e.to_string(),
        };

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        debug!("{operation}: {:?} {}", request.method, request.url);
        let resp = builder.send().map_err(connection)?;

        let status = resp.status().as_u16();
        let cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = resp.text().map_err(connection)?;

        Ok(HttpResponse {
            status,
            cookies,
            body,
        })
    }
}
