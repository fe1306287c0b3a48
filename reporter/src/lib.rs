//! Command-line reports for a DEGIRO account.
//!
//! Logs in with the credentials on the command line, runs one command
//! (portfolio, search, info, price, snapshot) and always logs out.

pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod report;
