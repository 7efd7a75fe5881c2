//! Common utilities shared by the CRUD services.
//!
//! This crate provides:
//! - Domain faults with HTTP mapping
//! - Log message templates and service configuration
//! - The logging collaborator and logging-context builder

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::{AppError, AppResult, BoxError};
pub use logging::{logging_context, EventLog, Fault, TracingLog, LOG_TARGET};

#[cfg(any(test, feature = "test-utils"))]
pub use logging::MockEventLog;
