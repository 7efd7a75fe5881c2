//! Storage faults.
//!
//! Every storage back-end reports failures with [`StorageError`]. The CRUD
//! service never lets it reach callers; it is wrapped into an `AppError`.

use common::Fault;
use sea_orm::DbErr;
use thiserror::Error;

/// Native fault type of the storage back-ends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filter or pagination the back-end cannot express
    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects {expected}")]
    TypeMismatch { field: String, expected: &'static str },

    #[error("Record has no id")]
    MissingId,

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The back-end reported that a dependent write did not happen
    #[error("{kind} record was not saved")]
    NotSaved { kind: String },

    #[error("{0}")]
    Backend(String),
}

impl StorageError {
    pub fn query(msg: impl Into<String>) -> Self {
        StorageError::Query(msg.into())
    }

    pub fn type_mismatch(field: impl Into<String>, expected: &'static str) -> Self {
        StorageError::TypeMismatch {
            field: field.into(),
            expected,
        }
    }
}

impl Fault for StorageError {
    fn code(&self) -> &str {
        match self {
            StorageError::Database(_) => "DATABASE_ERROR",
            StorageError::Query(_) => "INVALID_QUERY",
            StorageError::UnknownField(_) => "UNKNOWN_FIELD",
            StorageError::TypeMismatch { .. } => "TYPE_MISMATCH",
            StorageError::MissingId => "MISSING_ID",
            StorageError::DuplicateKey(_) => "DUPLICATE_KEY",
            StorageError::NotSaved { .. } => "NOT_SAVED",
            StorageError::Backend(_) => "BACKEND_ERROR",
        }
    }
}

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StorageError>;
