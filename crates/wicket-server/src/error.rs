//! Error types and axum `IntoResponse` implementation.
//!
//! Every validation failure collapses into the single cause-free
//! `Unauthorized` response — distinguishing wrong-token from
//! unknown-identifier from expired would leak which identifiers exist.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Generic refusal; deliberately carries no cause.
  #[error("invalid or expired")]
  Unauthorized,

  /// Administrative key mismatch.
  #[error("forbidden")]
  Forbidden,

  /// The membership backend could not be reached.
  #[error("service unavailable")]
  Unavailable,
}

impl From<wicket_core::Error> for Error {
  fn from(e: wicket_core::Error) -> Self {
    tracing::warn!(error = %e, "backend failure surfaced to the interactive path");
    Error::Unavailable
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid or expired" })),
      )
        .into_response(),
      Error::Forbidden => (StatusCode::FORBIDDEN, "forbidden").into_response(),
      Error::Unavailable => {
        (StatusCode::SERVICE_UNAVAILABLE, "service unavailable").into_response()
      }
    }
  }
}
