//! [`SheetsBackend`] — the Sheets v4 implementation of `TabularBackend`.
//!
//! The backend contract maps onto three `values` endpoints: `values.get`
//! over the whole worksheet for the row scan, `values.update` on a fixed
//! `A<i>:F<i>` range for whole-row overwrites, and `values.append` for
//! inserts. The spreadsheet itself is resolved once, by name, through a
//! Drive query — first match wins, matching the original client library's
//! `open()` behavior.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use wicket_core::backend::TabularBackend;

use crate::{
  auth::{ServiceAccountKey, TokenCache},
  error::{Error, Result, excerpt},
};

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES: &str = "https://www.googleapis.com/drive/v3/files";

/// Bound on every backend round trip. On timeout the error surfaces as-is;
/// a silent retry of an append could create duplicate rows.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Row writes always cover the full six-column width, `A..F`.
fn row_range(worksheet: &str, row_index: usize) -> String {
  format!("{worksheet}!A{row_index}:F{row_index}")
}

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct FileList {
  #[serde(default)]
  files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
  id: String,
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// A single worksheet of a named spreadsheet, addressed positionally.
///
/// Cheap to clone; the HTTP client and token cache are shared.
#[derive(Clone)]
pub struct SheetsBackend {
  http:           reqwest::Client,
  key:            ServiceAccountKey,
  tokens:         std::sync::Arc<TokenCache>,
  spreadsheet_id: String,
  worksheet:      String,
}

impl SheetsBackend {
  /// Authenticate and resolve the named spreadsheet. Fails fast — and
  /// without retrying — on missing or rejected credentials and on an
  /// unknown spreadsheet name.
  pub async fn connect(
    key: ServiceAccountKey,
    spreadsheet: &str,
    worksheet: &str,
  ) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    let tokens = TokenCache::new();
    let bearer = tokens.bearer(&http, &key).await?;
    let spreadsheet_id = resolve_spreadsheet_id(&http, &bearer, spreadsheet).await?;

    tracing::info!(spreadsheet, worksheet, "connected to sheets backend");
    Ok(Self {
      http,
      key,
      tokens: std::sync::Arc::new(tokens),
      spreadsheet_id,
      worksheet: worksheet.to_string(),
    })
  }

  async fn bearer(&self) -> Result<String> {
    self.tokens.bearer(&self.http, &self.key).await
  }

  fn values_url(&self, range: &str, suffix: &str) -> String {
    format!(
      "{SHEETS_BASE}/{}/values/{}{suffix}",
      self.spreadsheet_id,
      urlencoding::encode(range),
    )
  }
}

async fn checked(resp: reqwest::Response, context: &'static str) -> Result<reqwest::Response> {
  let status = resp.status();
  if status.is_success() {
    Ok(resp)
  } else {
    Err(Error::Api {
      context,
      status: status.as_u16(),
      body: excerpt(resp.text().await.unwrap_or_default()),
    })
  }
}

async fn resolve_spreadsheet_id(
  http: &reqwest::Client,
  bearer: &str,
  name: &str,
) -> Result<String> {
  let query = format!(
    "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
    name.replace('\\', "\\\\").replace('\'', "\\'"),
  );
  let resp = http
    .get(DRIVE_FILES)
    .bearer_auth(bearer)
    .query(&[
      ("q", query.as_str()),
      ("fields", "files(id, name)"),
      ("pageSize", "1"),
    ])
    .send()
    .await?;

  let list: FileList = checked(resp, "drive files.list").await?.json().await?;
  list
    .files
    .into_iter()
    .next()
    .map(|f| f.id)
    .ok_or_else(|| Error::SpreadsheetNotFound(name.to_string()))
}

impl TabularBackend for SheetsBackend {
  type Error = Error;

  async fn read_all_rows(&self) -> Result<Vec<Vec<String>>> {
    let bearer = self.bearer().await?;
    let resp = self
      .http
      .get(self.values_url(&self.worksheet, ""))
      .bearer_auth(&bearer)
      .send()
      .await?;

    let range: ValueRange = checked(resp, "values.get").await?.json().await?;
    tracing::debug!(rows = range.values.len(), "fetched worksheet");
    Ok(range.values)
  }

  async fn write_row(&self, row_index: usize, cells: Vec<String>) -> Result<()> {
    let bearer = self.bearer().await?;
    let range  = row_range(&self.worksheet, row_index);
    let resp = self
      .http
      .put(self.values_url(&range, ""))
      .bearer_auth(&bearer)
      .query(&[("valueInputOption", "RAW")])
      .json(&json!({
        "range": range,
        "majorDimension": "ROWS",
        "values": [cells],
      }))
      .send()
      .await?;

    checked(resp, "values.update").await?;
    Ok(())
  }

  async fn append_row(&self, cells: Vec<String>) -> Result<()> {
    let bearer = self.bearer().await?;
    let range  = row_range(&self.worksheet, 1);
    let resp = self
      .http
      .post(self.values_url(&range, ":append"))
      .bearer_auth(&bearer)
      .query(&[
        ("valueInputOption", "USER_ENTERED"),
        ("insertDataOption", "INSERT_ROWS"),
      ])
      .json(&json!({ "values": [cells] }))
      .send()
      .await?;

    checked(resp, "values.append").await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_range_covers_all_six_columns() {
    assert_eq!(row_range("usuarios", 2), "usuarios!A2:F2");
    assert_eq!(row_range("members", 17), "members!A17:F17");
  }

  #[test]
  fn value_range_tolerates_a_missing_values_field() {
    // An empty worksheet omits `values` entirely.
    let range: ValueRange =
      serde_json::from_str(r#"{"range": "usuarios!A1:F1"}"#).unwrap();
    assert!(range.values.is_empty());
  }

  #[test]
  fn value_range_decodes_rows() {
    let range: ValueRange = serde_json::from_str(
      r#"{"values": [["identifier", "status"], ["a@b.com", "active"]]}"#,
    )
    .unwrap();
    assert_eq!(range.values.len(), 2);
    assert_eq!(range.values[1][0], "a@b.com");
  }

  #[test]
  fn file_list_decodes_first_match() {
    let list: FileList = serde_json::from_str(
      r#"{"files": [{"id": "abc123", "name": "members"}]}"#,
    )
    .unwrap();
    assert_eq!(list.files[0].id, "abc123");

    let empty: FileList = serde_json::from_str("{}").unwrap();
    assert!(empty.files.is_empty());
  }
}
