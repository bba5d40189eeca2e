//! Google-Sheets implementation of the wicket
//! [`TabularBackend`](wicket_core::backend::TabularBackend).
//!
//! Authenticates as a service account (RS256 JWT bearer grant), resolves the
//! spreadsheet by name through the Drive API, and maps the backend contract
//! onto the Sheets v4 `values` endpoints. Every call is a bounded-timeout
//! round trip; nothing is cached except the bearer token.

mod auth;
mod sheets;

pub mod error;

pub use auth::ServiceAccountKey;
pub use error::{Error, Result};
pub use sheets::SheetsBackend;
