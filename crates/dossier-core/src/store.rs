//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `dossier-store-fs`). The API layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::record::{NewRecord, RecordName, StoredRecord};

/// Result of [`RecordStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
  /// The record was written and is now visible under this name.
  Saved(RecordName),
  /// A record with this name already exists; nothing was written.
  AlreadyExists(RecordName),
}

/// Abstraction over a Dossier record store backend.
///
/// Records are written once and never updated. All methods return `Send`
/// futures so the trait can be used from axum handlers.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Names of all stored records.
  fn list(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Read a record. Returns `None` if no complete record exists under `name`.
  fn get<'a>(
    &'a self,
    name: &'a RecordName,
  ) -> impl Future<Output = Result<Option<StoredRecord>, Self::Error>> + Send + 'a;

  /// Persist a new record together with its images.
  ///
  /// Either the whole record becomes visible under `record.name` or nothing
  /// does.
  fn save(
    &self,
    record: NewRecord,
  ) -> impl Future<Output = Result<SaveOutcome, Self::Error>> + Send + '_;
}
