//! The out-of-band administrative channel.
//!
//! `GET /admin?key=<secret>&cmd=<issue|revoke>&email=<id>[&days=<n>]`,
//! authenticated only by the shared static key — checked before any other
//! processing. Responses are plain status lines; every processing failure
//! is caught and reported as an opaque line with the error kind, so the
//! host process never crashes on this path.

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq as _;

use wicket_core::backend::TabularBackend;

use crate::{AppState, error::Error};

#[derive(Deserialize)]
pub struct AdminQuery {
  #[serde(default)]
  pub key:   String,
  #[serde(default)]
  pub cmd:   String,
  #[serde(default)]
  pub email: String,
  pub days:  Option<i64>,
}

/// Constant-time secret check. Both sides are digested first so unequal
/// lengths cannot short-circuit the comparison.
fn secret_matches(presented: &str, configured: &str) -> bool {
  let a = Sha256::digest(presented.as_bytes());
  let b = Sha256::digest(configured.as_bytes());
  a.as_slice().ct_eq(b.as_slice()).into()
}

pub async fn handler<B>(
  State(state): State<AppState<B>>,
  Query(query): Query<AdminQuery>,
) -> Response
where
  B: TabularBackend + Clone + Send + Sync + 'static,
{
  if !secret_matches(&query.key, &state.config.admin_key) {
    return Error::Forbidden.into_response();
  }

  match run_command(&state, &query).await {
    Ok(line) => (StatusCode::OK, line).into_response(),
    Err(e) => {
      tracing::error!(error = %e, cmd = %query.cmd, "admin command failed");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("app_error:{}", e.kind()),
      )
        .into_response()
    }
  }
}

async fn run_command<B>(
  state: &AppState<B>,
  query: &AdminQuery,
) -> wicket_core::Result<String>
where
  B: TabularBackend + Clone + Send + Sync + 'static,
{
  let cmd   = query.cmd.trim().to_lowercase();
  let email = query.email.trim().to_lowercase();

  match cmd.as_str() {
    "issue" if !email.is_empty() => {
      let token = state.gate.tokens().issue(&email, query.days).await?;
      Ok(format!("issued:{email}:{token}"))
    }
    "revoke" if !email.is_empty() => {
      state.gate.tokens().revoke(&email).await?;
      Ok(format!("revoked:{email}"))
    }
    _ => Ok("bad_command".to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn secret_matches_only_on_exact_equality() {
    assert!(secret_matches("pi-internal-123", "pi-internal-123"));
    assert!(!secret_matches("pi-internal-124", "pi-internal-123"));
    assert!(!secret_matches("", "pi-internal-123"));
    assert!(!secret_matches("pi", "pi-internal-123"));
  }
}
