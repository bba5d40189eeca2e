//! Membership records and the six-column row codec.
//!
//! The backing store is a header row followed by data rows of exactly six
//! ordered cells: `identifier, status, plan, expires_at, token_digest,
//! updated_at`. Column order is load-bearing — cells are addressed by
//! position, never by header name.

use serde::{Deserialize, Serialize};

/// Header row written when a sheet is first seeded.
pub const HEADER: [&str; 6] = [
  "identifier",
  "status",
  "plan",
  "expires_at",
  "token_digest",
  "updated_at",
];

/// Normalize an identifier for storage and lookup: trimmed, lowercased.
/// Applied on every read and write so `User@Example.com` and
/// `user@example.com` address the same record.
pub fn normalize(identifier: &str) -> String {
  identifier.trim().to_lowercase()
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Membership status. `Active` is necessary but not sufficient for access —
/// the expiry must also be in the future at check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
  Active,
  Inactive,
}

impl MemberStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      MemberStatus::Active   => "active",
      MemberStatus::Inactive => "inactive",
    }
  }

  /// Decode a status cell. Anything other than `active` is `Inactive` —
  /// fail-closed on garbage.
  pub fn parse(cell: &str) -> Self {
    if cell.trim() == "active" {
      MemberStatus::Active
    } else {
      MemberStatus::Inactive
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One membership row. `expires_at` and `updated_at` stay raw strings here;
/// expiry interpretation happens on demand in [`crate::expiry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
  pub identifier:   String,
  pub status:       MemberStatus,
  pub plan:         String,
  pub expires_at:   String,
  /// Lowercase hex SHA-256 of the current token; empty until first issuance.
  /// Never the plaintext token.
  pub token_digest: String,
  pub updated_at:   String,
}

impl MemberRecord {
  /// Decode a data row. Tolerates ragged rows: cells beyond the row's actual
  /// length read as empty strings rather than erroring.
  pub fn from_cells(cells: &[String]) -> Self {
    let cell = |i: usize| cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
    MemberRecord {
      identifier:   normalize(&cell(0)),
      status:       MemberStatus::parse(&cell(1)),
      plan:         cell(2),
      expires_at:   cell(3),
      token_digest: cell(4),
      updated_at:   cell(5),
    }
  }

  /// Encode as a full fixed-width row, ready for a whole-row write.
  pub fn to_cells(&self) -> Vec<String> {
    vec![
      normalize(&self.identifier),
      self.status.as_str().to_string(),
      self.plan.clone(),
      self.expires_at.clone(),
      self.token_digest.clone(),
      self.updated_at.clone(),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
  }

  #[test]
  fn decode_full_row() {
    let r = MemberRecord::from_cells(&row(&[
      "A@B.com",
      "active",
      "mensal",
      "2026-09-05",
      "deadbeef",
      "2026-08-06T10:00:00-03:00",
    ]));
    assert_eq!(r.identifier, "a@b.com");
    assert_eq!(r.status, MemberStatus::Active);
    assert_eq!(r.plan, "mensal");
    assert_eq!(r.expires_at, "2026-09-05");
    assert_eq!(r.token_digest, "deadbeef");
  }

  #[test]
  fn ragged_row_reads_missing_cells_as_empty() {
    let r = MemberRecord::from_cells(&row(&["a@b.com", "active"]));
    assert_eq!(r.plan, "");
    assert_eq!(r.expires_at, "");
    assert_eq!(r.token_digest, "");
    assert_eq!(r.updated_at, "");
  }

  #[test]
  fn unknown_status_decodes_inactive() {
    assert_eq!(MemberStatus::parse("ACTIVE"), MemberStatus::Inactive);
    assert_eq!(MemberStatus::parse("suspended"), MemberStatus::Inactive);
    assert_eq!(MemberStatus::parse(""), MemberStatus::Inactive);
    assert_eq!(MemberStatus::parse(" active "), MemberStatus::Active);
  }

  #[test]
  fn encode_normalizes_identifier() {
    let r = MemberRecord {
      identifier:   " User@Example.COM ".into(),
      status:       MemberStatus::Active,
      plan:         "mensal".into(),
      expires_at:   "2026-09-05".into(),
      token_digest: "".into(),
      updated_at:   "".into(),
    };
    assert_eq!(r.to_cells()[0], "user@example.com");
    assert_eq!(r.to_cells().len(), 6);
  }
}
