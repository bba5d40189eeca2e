//! The `TabularBackend` trait and an in-process implementation.
//!
//! A backend is a single named sub-table of a remote tabular resource:
//! a header row followed by data rows of string cells. There is no caching
//! and no transaction support — every call is a full round trip, and a
//! row write replaces the whole row (last-write-wins at the backend).
//!
//! Backend errors are non-retryable at this layer. The caller decides
//! whether to halt (administrative path) or degrade to a generic denial
//! (interactive path).

use std::{
  future::Future,
  sync::{Arc, Mutex},
};

use thiserror::Error;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a row-oriented remote store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TabularBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch every row, header first. Each call re-fetches; the sequence is
  /// finite and restartable.
  fn read_all_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<Vec<String>>, Self::Error>> + Send + '_;

  /// Overwrite an entire existing row. `row_index` is 1-based and counts
  /// the header, matching spreadsheet row numbering.
  fn write_row(
    &self,
    row_index: usize,
    cells: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append a new row after the last populated one.
  fn append_row(
    &self,
    cells: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── In-process implementation ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemBackendError {
  #[error("row {0} out of range")]
  RowOutOfRange(usize),
}

/// A `TabularBackend` over an in-process row matrix.
///
/// The reference implementation of the trait's contract, and the backend all
/// workspace tests run against. Cloning is cheap — clones share the rows.
#[derive(Clone)]
pub struct MemBackend {
  rows: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MemBackend {
  /// An empty table seeded with the standard header row.
  pub fn new() -> Self {
    let header = crate::member::HEADER.iter().map(|c| c.to_string()).collect();
    Self {
      rows: Arc::new(Mutex::new(vec![header])),
    }
  }

  /// A table with caller-supplied rows, header included. Lets tests seed
  /// ragged or duplicate data the codec must tolerate.
  pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
    Self {
      rows: Arc::new(Mutex::new(rows)),
    }
  }

  /// Copy of the current rows, for assertions.
  pub fn snapshot(&self) -> Vec<Vec<String>> {
    self.rows.lock().expect("backend mutex").clone()
  }
}

impl TabularBackend for MemBackend {
  type Error = MemBackendError;

  async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, MemBackendError> {
    Ok(self.rows.lock().expect("backend mutex").clone())
  }

  async fn write_row(
    &self,
    row_index: usize,
    cells: Vec<String>,
  ) -> Result<(), MemBackendError> {
    let mut rows = self.rows.lock().expect("backend mutex");
    if row_index == 0 || row_index > rows.len() {
      return Err(MemBackendError::RowOutOfRange(row_index));
    }
    rows[row_index - 1] = cells;
    Ok(())
  }

  async fn append_row(&self, cells: Vec<String>) -> Result<(), MemBackendError> {
    self.rows.lock().expect("backend mutex").push(cells);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
  }

  #[tokio::test]
  async fn new_backend_has_only_the_header() {
    let b = MemBackend::new();
    let rows = b.read_all_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "identifier");
  }

  #[tokio::test]
  async fn append_then_overwrite() {
    let b = MemBackend::new();
    b.append_row(row(&["a@b.com", "active"])).await.unwrap();
    b.write_row(2, row(&["a@b.com", "inactive"])).await.unwrap();
    let rows = b.read_all_rows().await.unwrap();
    assert_eq!(rows[1][1], "inactive");
  }

  #[tokio::test]
  async fn write_out_of_range_is_an_error() {
    let b = MemBackend::new();
    let err = b.write_row(5, row(&["x"])).await.unwrap_err();
    assert!(matches!(err, MemBackendError::RowOutOfRange(5)));
    let err = b.write_row(0, row(&["x"])).await.unwrap_err();
    assert!(matches!(err, MemBackendError::RowOutOfRange(0)));
  }

  #[tokio::test]
  async fn clones_share_rows() {
    let b = MemBackend::new();
    let c = b.clone();
    b.append_row(row(&["a@b.com"])).await.unwrap();
    assert_eq!(c.read_all_rows().await.unwrap().len(), 2);
  }
}
