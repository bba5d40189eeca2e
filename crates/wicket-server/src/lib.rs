//! HTTP boundary for the Wicket membership gate.
//!
//! Exposes an axum [`Router`] with the interactive login surface, the
//! per-access session re-check, and the out-of-band administrative channel,
//! backed by any [`TabularBackend`].

pub mod admin;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use wicket_core::{backend::TabularBackend, session::SessionGate};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `WICKET_*` environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,

  /// Name of the remote spreadsheet holding the membership table.
  #[serde(default = "default_spreadsheet")]
  pub spreadsheet: String,
  /// Worksheet (sub-table) title within it.
  #[serde(default = "default_worksheet")]
  pub worksheet: String,

  /// Shared static secret for the administrative channel. Must be set.
  pub admin_key: String,

  #[serde(default = "default_validity_days")]
  pub default_validity_days: i64,
  #[serde(default = "default_plan")]
  pub default_plan: String,
  /// Fixed offset, in whole hours east of UTC, used to interpret and write
  /// every timestamp.
  #[serde(default = "default_utc_offset_hours")]
  pub utc_offset_hours: i32,

  /// Path to the service-account key file. Ignored when
  /// `service_account_json` is set (the env-friendly alternative).
  #[serde(default)]
  pub service_account_path: Option<PathBuf>,
  #[serde(default)]
  pub service_account_json: Option<String>,
}

fn default_spreadsheet() -> String {
  "members".to_string()
}

fn default_worksheet() -> String {
  "usuarios".to_string()
}

fn default_validity_days() -> i64 {
  30
}

fn default_plan() -> String {
  "mensal".to_string()
}

fn default_utc_offset_hours() -> i32 {
  -3
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<B: TabularBackend> {
  pub gate:   Arc<SessionGate<B>>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the gate.
pub fn router<B>(state: AppState<B>) -> Router
where
  B: TabularBackend + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/health",  get(handlers::health))
    .route("/admin",   get(admin::handler::<B>))
    .route("/login",   post(handlers::login::<B>))
    .route("/session", get(handlers::session::<B>))
    .route("/logout",  post(handlers::logout::<B>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use tower::ServiceExt as _;

  use wicket_core::{
    backend::MemBackend,
    expiry::offset_from_hours,
    store::MemberStore,
    token::{TokenConfig, TokenService},
  };

  const ADMIN_KEY: &str = "pi-internal-123";

  fn make_state() -> (MemBackend, AppState<MemBackend>) {
    let backend = MemBackend::new();
    let store   = MemberStore::new(backend.clone(), offset_from_hours(-3).unwrap());
    let gate    = SessionGate::new(TokenService::new(store, TokenConfig::default()));

    let state = AppState {
      gate:   Arc::new(gate),
      config: Arc::new(ServerConfig {
        host:                  "127.0.0.1".to_string(),
        port:                  8080,
        spreadsheet:           "members".to_string(),
        worksheet:             "usuarios".to_string(),
        admin_key:             ADMIN_KEY.to_string(),
        default_validity_days: 30,
        default_plan:          "mensal".to_string(),
        utc_offset_hours:      -3,
        service_account_path:  None,
        service_account_json:  None,
      }),
    };
    (backend, state)
  }

  async fn oneshot_raw(
    state:   AppState<MemBackend>,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  /// Drive the admin channel to issue a token and return it.
  async fn issue_via_admin(state: &AppState<MemBackend>, email: &str) -> String {
    let resp = oneshot_raw(
      state.clone(),
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=issue&email={email}"),
      vec![],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let line = body_string(resp).await;
    line.rsplit(':').next().unwrap().to_string()
  }

  async fn login(state: &AppState<MemBackend>, email: &str, token: &str) -> axum::response::Response {
    oneshot_raw(
      state.clone(),
      "POST",
      "/login",
      vec![(header::CONTENT_TYPE, "application/json")],
      &format!(r#"{{"identifier": "{email}", "token": "{token}"}}"#),
    ).await
  }

  // ── Liveness ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_auth() {
    let (_, state) = make_state();
    let resp = oneshot_raw(state, "GET", "/health", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "ok");
  }

  // ── Admin channel ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_with_wrong_key_is_refused_before_processing() {
    let (backend, state) = make_state();
    let resp = oneshot_raw(
      state,
      "GET",
      "/admin?key=wrong&cmd=issue&email=a@b.com",
      vec![],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(backend.snapshot().len(), 1, "no row may be written");
  }

  #[tokio::test]
  async fn admin_issue_emits_the_token_line() {
    let (backend, state) = make_state();
    let resp = oneshot_raw(
      state,
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=issue&email=a@b.com"),
      vec![],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let line = body_string(resp).await;
    assert!(line.starts_with("issued:a@b.com:"), "line: {line}");
    let token = line.rsplit(':').next().unwrap();
    assert_eq!(token.len(), 16);

    let rows = backend.snapshot();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "active");
  }

  #[tokio::test]
  async fn admin_revoke_emits_the_revoked_line() {
    let (backend, state) = make_state();
    issue_via_admin(&state, "a@b.com").await;

    let resp = oneshot_raw(
      state,
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=revoke&email=a@b.com"),
      vec![],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "revoked:a@b.com");
    assert_eq!(backend.snapshot()[1][1], "inactive");
  }

  #[tokio::test]
  async fn admin_rejects_unknown_or_incomplete_commands() {
    let (_, state) = make_state();

    let resp = oneshot_raw(
      state.clone(),
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=promote&email=a@b.com"),
      vec![],
      "",
    ).await;
    assert_eq!(body_string(resp).await, "bad_command");

    let resp = oneshot_raw(
      state,
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=issue"),
      vec![],
      "",
    ).await;
    assert_eq!(body_string(resp).await, "bad_command");
  }

  #[tokio::test]
  async fn admin_issue_honors_the_days_override() {
    let (backend, state) = make_state();
    let resp = oneshot_raw(
      state,
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=issue&email=a@b.com&days=5"),
      vec![],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let offset  = offset_from_hours(-3).unwrap();
    let expires = wicket_core::expiry::parse_expiry(&backend.snapshot()[1][3], offset).unwrap();
    let delta   = expires.signed_duration_since(wicket_core::expiry::now_at(offset));
    assert!(delta <= chrono::Duration::days(5));
    assert!(delta > chrono::Duration::days(4));
  }

  // ── Interactive surface ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_then_session_round_trip() {
    let (_, state) = make_state();
    let token = issue_via_admin(&state, "a@b.com").await;

    let resp = login(&state, "a@b.com", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["identifier"], "a@b.com");
    let marker = parsed["session"].as_str().unwrap().to_string();

    let resp = oneshot_raw(
      state,
      "GET",
      "/session",
      vec![(header::AUTHORIZATION, &format!("Bearer {marker}"))],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let parsed: serde_json::Value =
      serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(parsed["identifier"], "a@b.com");
  }

  #[tokio::test]
  async fn login_failures_share_one_generic_message() {
    let (_, state) = make_state();
    let token = issue_via_admin(&state, "a@b.com").await;

    let wrong_token   = login(&state, "a@b.com", "0000000000000000").await;
    let unknown_ident = login(&state, "nobody@b.com", &token).await;

    assert_eq!(wrong_token.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_ident.status(), StatusCode::UNAUTHORIZED);

    let a = body_string(wrong_token).await;
    let b = body_string(unknown_ident).await;
    assert_eq!(a, b, "refusals must be indistinguishable");
    assert!(a.contains("invalid or expired"));
  }

  #[tokio::test]
  async fn login_is_case_insensitive_on_identifier() {
    let (_, state) = make_state();
    let token = issue_via_admin(&state, "User@Example.com").await;
    let resp  = login(&state, "user@example.com", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn revocation_mid_session_denies_the_next_access() {
    let (_, state) = make_state();
    let token = issue_via_admin(&state, "a@b.com").await;

    let resp = login(&state, "a@b.com", &token).await;
    let parsed: serde_json::Value =
      serde_json::from_str(&body_string(resp).await).unwrap();
    let marker = parsed["session"].as_str().unwrap().to_string();

    oneshot_raw(
      state.clone(),
      "GET",
      &format!("/admin?key={ADMIN_KEY}&cmd=revoke&email=a@b.com"),
      vec![],
      "",
    ).await;

    let resp = oneshot_raw(
      state,
      "GET",
      "/session",
      vec![(header::AUTHORIZATION, &format!("Bearer {marker}"))],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn session_without_a_marker_is_refused() {
    let (_, state) = make_state();
    let resp = oneshot_raw(state.clone(), "GET", "/session", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = oneshot_raw(
      state,
      "GET",
      "/session",
      vec![(header::AUTHORIZATION, "Bearer not-a-uuid")],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn logout_is_idempotent() {
    let (_, state) = make_state();
    let token = issue_via_admin(&state, "a@b.com").await;

    let resp = login(&state, "a@b.com", &token).await;
    let parsed: serde_json::Value =
      serde_json::from_str(&body_string(resp).await).unwrap();
    let marker = parsed["session"].as_str().unwrap().to_string();
    let bearer = format!("Bearer {marker}");

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/logout",
      vec![(header::AUTHORIZATION, &bearer)],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Second logout and a logout with no marker both succeed quietly.
    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/logout",
      vec![(header::AUTHORIZATION, &bearer)],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = oneshot_raw(state.clone(), "POST", "/logout", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = oneshot_raw(
      state,
      "GET",
      "/session",
      vec![(header::AUTHORIZATION, &bearer)],
      "",
    ).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
