//! Error type for `wicket-store-sheets`.
//!
//! Everything here is non-retryable from the caller's point of view: a
//! failed append retried blindly could duplicate rows, so retries are never
//! attempted at this layer. Error messages carry at most a truncated
//! response excerpt and never credential material.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Service-account credentials missing or malformed. A configuration
  /// error — fatal at startup or first use, reported once to the operator.
  #[error("credentials error: {0}")]
  Credentials(String),

  /// Signing the grant assertion failed.
  #[error("jwt signing error: {0}")]
  Jwt(#[from] jsonwebtoken::errors::Error),

  /// Transport-level failure (connect, timeout, TLS).
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The token endpoint refused the signed assertion.
  #[error("token grant refused: status {status}: {body}")]
  TokenGrant { status: u16, body: String },

  /// No spreadsheet with the configured name is visible to the service
  /// account.
  #[error("spreadsheet not found: {0:?}")]
  SpreadsheetNotFound(String),

  /// A Sheets/Drive call came back non-2xx.
  #[error("sheets api error on {context}: status {status}: {body}")]
  Api {
    context: &'static str,
    status:  u16,
    body:    String,
  },
}

/// Cap a response body for inclusion in an error message.
pub(crate) fn excerpt(body: String) -> String {
  const MAX: usize = 200;
  if body.len() <= MAX {
    body
  } else {
    let cut = body
      .char_indices()
      .take_while(|(i, _)| *i < MAX)
      .last()
      .map(|(i, c)| i + c.len_utf8())
      .unwrap_or(0);
    format!("{}…", &body[..cut])
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
