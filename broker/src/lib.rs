//! Session and raw data retrieval for the DEGIRO trading API.
//!
//! - [`DegiroClient`]: one method per endpoint, stateless, explicit
//!   [`SessionContext`]
//! - [`Session`]: login, cached snapshot, normalized portfolio and cash,
//!   logout on close
//! - [`Transport`]: the HTTP seam. [`http::HttpTransport`] (feature `http`)
//!   talks to the network; [`mock::MockTransport`] replays canned responses.

pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod mock;
pub mod session;
pub mod transport;

#[cfg(feature = "http")]
pub mod http;

pub use client::{DegiroClient, SessionContext, SessionToken};
pub use credentials::Credentials;
pub use endpoints::Endpoints;
pub use error::DegiroError;
pub use session::{DEFAULT_SEARCH_LIMIT, Session};
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
