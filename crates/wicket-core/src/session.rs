//! Process-local sessions and the access gate.
//!
//! A session is nothing but proof that an identifier passed validation at
//! some point in this process — it is re-checked against current membership
//! status on *every* protected access, so a revocation lands on the next
//! call, not at the next login. Sessions are kept in an explicit registry
//! keyed by opaque markers and threaded through the request boundary; there
//! is no ambient "currently logged in" global.

use std::{
  collections::HashMap,
  sync::Mutex,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  backend::TabularBackend,
  error::Result,
  token::TokenService,
};

/// A process-local authenticated session. Never persisted.
#[derive(Debug, Clone)]
pub struct Session {
  pub identifier:     String,
  pub established_at: DateTime<Utc>,
}

/// Outcome of an admission check. `Denied` deliberately carries no cause:
/// wrong token, unknown identifier, and expired or revoked membership are
/// indistinguishable to the caller, so the surface cannot be used to
/// enumerate identifiers.
#[derive(Debug, Clone)]
pub enum Admission {
  Granted { marker: Uuid, session: Session },
  Denied,
}

impl Admission {
  pub fn is_denied(&self) -> bool {
    matches!(self, Admission::Denied)
  }
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// The boundary between unauthenticated requests and protected content.
pub struct SessionGate<B> {
  tokens:   TokenService<B>,
  sessions: Mutex<HashMap<Uuid, Session>>,
}

impl<B: TabularBackend> SessionGate<B> {
  pub fn new(tokens: TokenService<B>) -> Self {
    Self {
      tokens,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  pub fn tokens(&self) -> &TokenService<B> {
    &self.tokens
  }

  /// Validate a presented credential pair and, on success, establish a
  /// session under a fresh opaque marker. Backend failures are errors;
  /// every validation failure is a bare `Denied`.
  pub async fn authenticate(&self, identifier: &str, token: &str) -> Result<Admission> {
    if !self.tokens.validate(identifier, token).await? {
      return Ok(Admission::Denied);
    }

    let session = Session {
      identifier:     crate::member::normalize(identifier),
      established_at: Utc::now(),
    };
    let marker = Uuid::new_v4();
    self
      .sessions
      .lock()
      .expect("session mutex")
      .insert(marker, session.clone());

    tracing::debug!(identifier = %session.identifier, "session established");
    Ok(Admission::Granted { marker, session })
  }

  /// Admit or refuse a protected access. Re-checks `is_active` against the
  /// store on every call; a session whose membership lapsed or was revoked
  /// is evicted and refused.
  pub async fn require(&self, marker: Option<Uuid>) -> Result<Admission> {
    let Some(marker) = marker else {
      return Ok(Admission::Denied);
    };
    let session = {
      let sessions = self.sessions.lock().expect("session mutex");
      sessions.get(&marker).cloned()
    };
    let Some(session) = session else {
      return Ok(Admission::Denied);
    };

    if !self.tokens.store().is_active(&session.identifier).await? {
      self.sessions.lock().expect("session mutex").remove(&marker);
      tracing::debug!(identifier = %session.identifier, "session evicted on re-check");
      return Ok(Admission::Denied);
    }

    Ok(Admission::Granted { marker, session })
  }

  /// Destroy a session. Unknown markers are ignored — logout is idempotent.
  pub fn logout(&self, marker: Uuid) {
    self.sessions.lock().expect("session mutex").remove(&marker);
  }
}
