//! Storage collaborator contract.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{FieldSelection, Record, RecordId};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::error::StoreResult;
use super::query::RecordQuery;

/// Persistable-record capability used by the CRUD service.
///
/// A store owns one record type. Reads return records marked as persisted;
/// `save` inserts records that do not exist yet and updates the others.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Record type name, used in log messages
    fn kind(&self) -> String;

    /// Find a record by its identifier
    async fn find_by_id(&self, id: &RecordId, fields: &FieldSelection)
        -> StoreResult<Option<Record>>;

    /// Persist a record; `false` when the back-end refused the write
    async fn save(&self, record: &Record) -> StoreResult<bool>;

    /// Remove a record; `false` when nothing was deleted
    async fn delete(&self, record: &Record) -> StoreResult<bool>;

    /// Count records matching the query conditions (pagination ignored)
    async fn count(&self, query: &RecordQuery) -> StoreResult<u64>;

    /// Execute the query and return the selected fields of each match
    async fn fetch(&self, query: &RecordQuery, fields: &FieldSelection)
        -> StoreResult<Vec<Record>>;

    /// Look up a named relationship of this record type
    fn relationship(&self, name: &str) -> Option<Arc<dyn Relationship>>;
}

/// Named association between a parent record and related records
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Relationship: Send + Sync {
    /// Load every record related to `parent`
    async fn load(&self, parent: &Record) -> StoreResult<Vec<Record>>;

    /// Link `related` to `parent`, persist it and return the stored record
    async fn associate(&self, parent: &Record, related: Record) -> StoreResult<Record>;
}
