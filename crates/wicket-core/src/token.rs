//! Token issuance, validation, and revocation.
//!
//! Tokens are opaque 16-character lowercase-hex credentials. Only their
//! SHA-256 digest is ever persisted; the plaintext exists exactly once, in
//! the return value of [`TokenService::issue`]. Validation compares digests
//! with a constant-time equality check so response timing leaks nothing
//! about the stored value.

use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq as _;

use crate::{
  backend::TabularBackend,
  error::Result,
  expiry,
  member::{MemberStatus, normalize},
  store::MemberStore,
};

/// Plaintext token length in hex characters.
pub const TOKEN_LEN: usize = 16;

/// Lowercase hex SHA-256 of `input` — the only persisted form of a token.
pub fn sha256_hex(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}

/// Issuance defaults, overridable per call / via configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
  pub validity_days: i64,
  pub plan:          String,
}

impl Default for TokenConfig {
  fn default() -> Self {
    Self {
      validity_days: 30,
      plan:          "mensal".to_string(),
    }
  }
}

/// Derive a fresh token: SHA-256 over the identifier, the current
/// timestamp, and 16 bytes of OS randomness, truncated to [`TOKEN_LEN`]
/// hex characters.
fn new_token(identifier: &str) -> String {
  let mut noise = [0u8; 16];
  OsRng.fill_bytes(&mut noise);

  let mut hasher = Sha256::new();
  hasher.update(identifier.as_bytes());
  hasher.update(Utc::now().timestamp_micros().to_le_bytes());
  hasher.update(noise);

  let mut token = hex::encode(hasher.finalize());
  token.truncate(TOKEN_LEN);
  token
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Issues, revokes, and validates membership tokens on top of a
/// [`MemberStore`].
pub struct TokenService<B> {
  store:  MemberStore<B>,
  config: TokenConfig,
}

impl<B: TabularBackend> TokenService<B> {
  pub fn new(store: MemberStore<B>, config: TokenConfig) -> Self {
    Self { store, config }
  }

  pub fn store(&self) -> &MemberStore<B> {
    &self.store
  }

  /// Issue a fresh token for `identifier`, valid for `validity_days`
  /// (default from config). Re-issuing replaces the stored digest and
  /// expiry, so any previously issued token stops validating. An existing
  /// record keeps its plan label; a new record gets the default.
  ///
  /// Returns the plaintext token — the single place it ever exists.
  pub async fn issue(&self, identifier: &str, validity_days: Option<i64>) -> Result<String> {
    let identifier = normalize(identifier);
    let days       = validity_days.unwrap_or(self.config.validity_days);

    let plan = self
      .store
      .get(&identifier)
      .await?
      .map(|r| r.plan)
      .filter(|p| !p.is_empty())
      .unwrap_or_else(|| self.config.plan.clone());

    let token   = new_token(&identifier);
    let digest  = sha256_hex(&token);
    let expires = expiry::format_ts(expiry::now_at(self.store.offset()) + Duration::days(days));

    self
      .store
      .upsert(&identifier, MemberStatus::Active, &plan, &expires, &digest)
      .await?;

    tracing::info!(identifier = %identifier, days, "token issued");
    Ok(token)
  }

  /// Flip `identifier` to inactive, carrying every other field verbatim.
  /// Auditability over destructiveness: expiry, plan, and digest stay put.
  /// A missing record is a no-op, so revoke is idempotent.
  pub async fn revoke(&self, identifier: &str) -> Result<()> {
    let Some(existing) = self.store.get(identifier).await? else {
      return Ok(());
    };
    self
      .store
      .upsert(
        identifier,
        MemberStatus::Inactive,
        &existing.plan,
        &existing.expires_at,
        &existing.token_digest,
      )
      .await?;

    tracing::info!(identifier = %normalize(identifier), "access revoked");
    Ok(())
  }

  /// Check a presented `(identifier, token)` pair. Read-only — no state
  /// changes on failure. All refusal causes collapse into `false`.
  pub async fn validate(&self, identifier: &str, presented: &str) -> Result<bool> {
    if presented.is_empty() {
      return Ok(false);
    }
    let Some(record) = self.store.get(identifier).await? else {
      return Ok(false);
    };
    if record.token_digest.is_empty() {
      return Ok(false);
    }
    if !self.store.is_active(identifier).await? {
      return Ok(false);
    }

    let presented_digest = sha256_hex(presented);
    Ok(
      presented_digest
        .as_bytes()
        .ct_eq(record.token_digest.as_bytes())
        .into(),
    )
  }
}
