//! Interactive surface: login, session re-check, logout, liveness.
//!
//! The login form is two opaque strings in, an opaque session marker out.
//! Protected reads never trust a cached decision — `GET /session` runs the
//! full membership re-check on every call.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wicket_core::{backend::TabularBackend, session::Admission};

use crate::{AppState, error::Error};

/// Liveness probe for the hosting platform.
pub async fn health() -> &'static str {
  "ok"
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
  pub identifier: String,
  pub token:      String,
}

#[derive(Serialize)]
pub struct LoginResponse {
  pub session:    Uuid,
  pub identifier: String,
}

pub async fn login<B>(
  State(state): State<AppState<B>>,
  Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Error>
where
  B: TabularBackend + Clone + Send + Sync + 'static,
{
  match state.gate.authenticate(&req.identifier, &req.token).await? {
    Admission::Granted { marker, session } => Ok(Json(LoginResponse {
      session:    marker,
      identifier: session.identifier,
    })),
    Admission::Denied => Err(Error::Unauthorized),
  }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Pull the session marker out of `Authorization: Bearer <uuid>`.
/// Anything malformed reads as "no session".
fn bearer_marker(headers: &HeaderMap) -> Option<Uuid> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

#[derive(Serialize)]
pub struct SessionResponse {
  pub identifier: String,
}

pub async fn session<B>(
  State(state): State<AppState<B>>,
  headers: HeaderMap,
) -> Result<Json<SessionResponse>, Error>
where
  B: TabularBackend + Clone + Send + Sync + 'static,
{
  match state.gate.require(bearer_marker(&headers)).await? {
    Admission::Granted { session, .. } => Ok(Json(SessionResponse {
      identifier: session.identifier,
    })),
    Admission::Denied => Err(Error::Unauthorized),
  }
}

pub async fn logout<B>(
  State(state): State<AppState<B>>,
  headers: HeaderMap,
) -> StatusCode
where
  B: TabularBackend + Clone + Send + Sync + 'static,
{
  if let Some(marker) = bearer_marker(&headers) {
    state.gate.logout(marker);
  }
  StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bearer_marker_parses_well_formed_headers() {
    let marker = Uuid::new_v4();
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      format!("Bearer {marker}").parse().unwrap(),
    );
    assert_eq!(bearer_marker(&headers), Some(marker));
  }

  #[test]
  fn bearer_marker_rejects_garbage() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_marker(&headers), None);

    headers.insert(header::AUTHORIZATION, "Bearer not-a-uuid".parse().unwrap());
    assert_eq!(bearer_marker(&headers), None);

    headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
    assert_eq!(bearer_marker(&headers), None);
  }
}
