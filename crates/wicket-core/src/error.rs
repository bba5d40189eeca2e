//! Error type for `wicket-core`.
//!
//! Validation outcomes (unknown identifier, wrong token, expired or revoked
//! membership) are *values*, not errors — they surface as `bool` or
//! [`Admission::Denied`](crate::session::Admission). Only genuinely
//! exceptional conditions, all of them backend failures, appear here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The tabular backend could not be reached or rejected the call.
  /// Non-retryable: a blind retry of an append could duplicate rows.
  #[error("backend unavailable: {0}")]
  BackendUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn backend<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::BackendUnavailable(Box::new(e))
  }

  /// Short stable label for operator-facing diagnostics.
  pub fn kind(&self) -> &'static str {
    match self {
      Error::BackendUnavailable(_) => "BackendUnavailable",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
