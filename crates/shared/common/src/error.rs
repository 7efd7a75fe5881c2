//! Domain faults raised by the CRUD service.
//!
//! Storage-layer faults never cross the service boundary: they are wrapped
//! into one of these variants, keeping the original fault as `source`.
//! The type converts into an Axum HTTP response for controllers.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Boxed underlying fault
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Input of the wrong type or out of range
    #[error("{0}")]
    InvalidArgument(String),

    /// Record absent, or lookup failed in storage
    #[error("{message}")]
    NotFound {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Storage refused or failed to persist a record
    #[error("{message}")]
    SaveFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Storage refused or failed to delete a record
    #[error("{message}")]
    DeleteFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Any other storage failure (listing, relationships)
    #[error("{message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::SaveFailed { .. } => "SAVE_FAILED",
            AppError::DeleteFailed { .. } => "DELETE_FAILED",
            AppError::OperationFailed { .. } => "OPERATION_FAILED",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides storage details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg) => msg.clone(),
            AppError::NotFound { .. } => "We were unable to locate this record".to_string(),
            AppError::SaveFailed { .. } => "There was an error saving the record".to_string(),
            AppError::DeleteFailed { .. } => "There was an error deleting the record".to_string(),
            AppError::OperationFailed { .. } => {
                "There was an error processing the request".to_string()
            }
        }
    }

    /// Check if the error wraps an underlying storage fault
    pub fn has_cause(&self) -> bool {
        match self {
            AppError::InvalidArgument(_) => false,
            AppError::NotFound { source, .. }
            | AppError::SaveFailed { source, .. }
            | AppError::DeleteFailed { source, .. }
            | AppError::OperationFailed { source, .. } => source.is_some(),
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors
impl AppError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound {
            message: msg.into(),
            source: None,
        }
    }

    pub fn save_failed(msg: impl Into<String>) -> Self {
        AppError::SaveFailed {
            message: msg.into(),
            source: None,
        }
    }

    pub fn delete_failed(msg: impl Into<String>) -> Self {
        AppError::DeleteFailed {
            message: msg.into(),
            source: None,
        }
    }

    pub fn operation_failed(msg: impl Into<String>) -> Self {
        AppError::OperationFailed {
            message: msg.into(),
            source: None,
        }
    }

    // Wrapping constructors keep the fault's message and chain it as source.

    pub fn not_found_from<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        AppError::NotFound {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn save_failed_from<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        AppError::SaveFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn delete_failed_from<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        AppError::DeleteFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn operation_failed_from<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        AppError::OperationFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
