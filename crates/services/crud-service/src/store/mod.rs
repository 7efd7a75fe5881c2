//! Storage layer contract shared by every back-end.

mod error;
mod has_many;
mod query;
mod record_store;

pub use error::{StorageError, StoreResult};
pub use has_many::HasMany;
pub use query::RecordQuery;
pub use record_store::{RecordStore, Relationship};

#[cfg(any(test, feature = "test-utils"))]
pub use record_store::{MockRecordStore, MockRelationship};
