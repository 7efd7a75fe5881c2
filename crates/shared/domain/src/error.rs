//! Domain-level errors.
//!
//! These errors represent invalid input to the CRUD contract.
//! They are independent of infrastructure concerns (HTTP, database).

use thiserror::Error;

/// Domain-specific errors for contract violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An argument has the wrong type or is out of range
    #[error("{0}")]
    InvalidArgument(String),

    /// A filter operator that the query contract does not know
    #[error("Unsupported filter operator: {0}")]
    UnsupportedOperator(String),
}

impl DomainError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        DomainError::InvalidArgument(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
