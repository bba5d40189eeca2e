//! Expiry interpretation at a fixed UTC offset.
//!
//! Two cell formats are accepted: a full RFC 3339 timestamp with offset, or
//! a bare `YYYY-MM-DD` date read as end-of-day at the configured offset.
//! Anything else — including an empty cell — is treated as already expired,
//! never as an error. Fail-closed: when the data is bad, the answer is
//! "access denied", not a crash on the access-check path.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};

/// Build a fixed offset from whole hours east of UTC (e.g. `-3`).
/// `None` if out of the valid ±23 h range.
pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
  FixedOffset::east_opt(hours * 3600)
}

/// Current time expressed at `offset`.
pub fn now_at(offset: FixedOffset) -> DateTime<FixedOffset> {
  Utc::now().with_timezone(&offset)
}

/// Timestamp format written into `expires_at` / `updated_at` cells:
/// RFC 3339 at seconds precision, offset included.
pub fn format_ts(dt: DateTime<FixedOffset>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse an expiry cell. `None` means unparsable, which callers must treat
/// as expired.
pub fn parse_expiry(cell: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
  let cell = cell.trim();
  if cell.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
    return Some(dt.with_timezone(&offset));
  }
  let date = NaiveDate::parse_from_str(cell, "%Y-%m-%d").ok()?;
  date
    .and_hms_opt(23, 59, 59)?
    .and_local_timezone(offset)
    .single()
}
