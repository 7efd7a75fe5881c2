//! CRUD Service Library
//!
//! Generic retrieve / create / update / delete / paginated listing over any
//! [`RecordStore`], with storage faults translated into `AppError`s and
//! logged through an injected `EventLog`.
//!
//! Two back-ends are provided: [`MemoryStore`] and [`SeaOrmStore`].

pub mod infra;
pub mod service;
pub mod store;

pub use infra::{FieldKind, FieldMap, MemoryStore, SeaOrmStore};
pub use service::{CrudManager, CrudService, ListOptions};
pub use store::{HasMany, RecordQuery, RecordStore, Relationship, StorageError, StoreResult};

#[cfg(any(test, feature = "test-utils"))]
pub use store::{MockRecordStore, MockRelationship};
