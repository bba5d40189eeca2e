//! `MemberStore` — membership reads and upserts over a [`TabularBackend`].
//!
//! The backend has no index and no uniqueness constraint, so the key
//! invariant (at most one row per normalized identifier) is enforced by
//! find-before-write. The scan-then-write in [`MemberStore::upsert`] is
//! **not** atomic against concurrent writers: two racing upserts for the
//! same identifier resolve as last-write-wins, and in the rare window where
//! both lookups precede both writes, duplicate rows can appear. Reads pin
//! that case down deterministically — the *first* matching row wins.

use chrono::FixedOffset;

use crate::{
  backend::TabularBackend,
  error::{Error, Result},
  expiry,
  member::{MemberRecord, MemberStatus, normalize},
};

/// Membership repository keyed by normalized identifier.
pub struct MemberStore<B> {
  backend: B,
  offset:  FixedOffset,
}

impl<B: TabularBackend> MemberStore<B> {
  pub fn new(backend: B, offset: FixedOffset) -> Self {
    Self { backend, offset }
  }

  /// The fixed offset all timestamps are interpreted and written at.
  pub fn offset(&self) -> FixedOffset {
    self.offset
  }

  async fn rows(&self) -> Result<Vec<Vec<String>>> {
    self.backend.read_all_rows().await.map_err(Error::backend)
  }

  /// First data row matching `identifier`, decoded. The header row is
  /// skipped; matching is on the normalized first cell.
  pub async fn get(&self, identifier: &str) -> Result<Option<MemberRecord>> {
    let wanted = normalize(identifier);
    for row in self.rows().await?.iter().skip(1) {
      let key = row.first().map(|c| normalize(c));
      if key.as_deref() == Some(wanted.as_str()) {
        return Ok(Some(MemberRecord::from_cells(row)));
      }
    }
    Ok(None)
  }

  /// 1-based sheet index (header = row 1) of the first matching data row.
  pub async fn find_row_index(&self, identifier: &str) -> Result<Option<usize>> {
    let wanted = normalize(identifier);
    for (idx, row) in self.rows().await?.iter().enumerate().skip(1) {
      let key = row.first().map(|c| normalize(c));
      if key.as_deref() == Some(wanted.as_str()) {
        return Ok(Some(idx + 1));
      }
    }
    Ok(None)
  }

  /// Whether `identifier` currently has access: a record must exist, its
  /// status must be `active`, and its expiry must parse and lie in the
  /// future (inclusive). Bad data never errors here — it denies.
  pub async fn is_active(&self, identifier: &str) -> Result<bool> {
    let Some(record) = self.get(identifier).await? else {
      return Ok(false);
    };
    if record.status != MemberStatus::Active {
      return Ok(false);
    }
    let Some(expires) = expiry::parse_expiry(&record.expires_at, self.offset) else {
      return Ok(false);
    };
    Ok(expiry::now_at(self.offset) <= expires)
  }

  /// Insert-if-absent-else-overwrite. The whole fixed-width row is written;
  /// `updated_at` is set to now. See the module docs for the accepted race
  /// window.
  pub async fn upsert(
    &self,
    identifier: &str,
    status: MemberStatus,
    plan: &str,
    expires_at: &str,
    token_digest: &str,
  ) -> Result<()> {
    let record = MemberRecord {
      identifier:   normalize(identifier),
      status,
      plan:         plan.to_string(),
      expires_at:   expires_at.to_string(),
      token_digest: token_digest.to_string(),
      updated_at:   expiry::format_ts(expiry::now_at(self.offset)),
    };
    let cells = record.to_cells();

    match self.find_row_index(identifier).await? {
      Some(idx) => {
        tracing::debug!(identifier = %record.identifier, row = idx, "overwriting member row");
        self.backend.write_row(idx, cells).await.map_err(Error::backend)
      }
      None => {
        tracing::debug!(identifier = %record.identifier, "appending member row");
        self.backend.append_row(cells).await.map_err(Error::backend)
      }
    }
  }

  /// All data rows decoded, in scan order.
  pub async fn list(&self) -> Result<Vec<MemberRecord>> {
    Ok(
      self
        .rows()
        .await?
        .iter()
        .skip(1)
        .map(|row| MemberRecord::from_cells(row))
        .collect(),
    )
  }
}
