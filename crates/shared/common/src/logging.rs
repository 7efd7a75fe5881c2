//! Structured logging for faults caught by the CRUD service.
//!
//! [`logging_context`] turns a caught fault into a flat JSON object that is
//! handed to an [`EventLog`] together with a rendered message.

use std::error::Error as StdError;
use std::panic::Location;

use domain::Attributes;
use serde_json::Value;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::error::AppError;

/// Target used for every event emitted by [`TracingLog`]
pub const LOG_TARGET: &str = "crud_service";

/// A fault that carries a machine-readable code.
pub trait Fault: StdError {
    fn code(&self) -> &str;
}

impl Fault for AppError {
    fn code(&self) -> &str {
        AppError::code(self)
    }
}

/// Build the logging context for a caught fault.
///
/// The context always holds `file` and `line` of the caller, the fault
/// `message` and its `code`. With `include_trace`, `trace` lists the fault
/// and each of its sources, outermost first. Extra contexts are merged
/// afterwards in order; later keys overwrite earlier ones.
#[track_caller]
pub fn logging_context<F: Fault>(
    fault: &F,
    extra_contexts: &[Attributes],
    include_trace: bool,
) -> Attributes {
    let location = Location::caller();

    let mut context = Attributes::new();
    context.insert("file".into(), Value::from(location.file()));
    context.insert("line".into(), Value::from(location.line()));
    context.insert("message".into(), Value::from(fault.to_string()));
    context.insert("code".into(), Value::from(fault.code()));

    if include_trace {
        let mut trace = Vec::new();
        let mut current: Option<&dyn StdError> = Some(fault);
        while let Some(err) = current {
            trace.push(Value::from(err.to_string()));
            current = err.source();
        }
        context.insert("trace".into(), Value::Array(trace));
    }

    for extra in extra_contexts {
        for (key, value) in extra {
            context.insert(key.clone(), value.clone());
        }
    }

    context
}

/// Logging collaborator of the CRUD service
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait EventLog: Send + Sync {
    fn info(&self, message: &str, context: &Attributes);

    fn error(&self, message: &str, context: &Attributes);
}

/// [`EventLog`] backed by `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn info(&self, message: &str, context: &Attributes) {
        let context = Value::Object(context.clone());
        tracing::info!(target: LOG_TARGET, context = %context, "{}", message);
    }

    fn error(&self, message: &str, context: &Attributes) {
        let context = Value::Object(context.clone());
        tracing::error!(target: LOG_TARGET, context = %context, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("duplicate key value violates unique constraint")]
    struct ConstraintViolation;

    fn extra(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_context_has_location_message_and_code() {
        let fault = AppError::not_found("Unable to locate widget with id 7");
        let context = logging_context(&fault, &[], false);

        assert_eq!(context["file"], json!(file!()));
        assert!(context["line"].as_u64().unwrap() > 0);
        assert_eq!(context["message"], json!("Unable to locate widget with id 7"));
        assert_eq!(context["code"], json!("NOT_FOUND"));
        assert!(!context.contains_key("trace"));
    }

    #[test]
    fn test_trace_walks_source_chain() {
        let fault = AppError::save_failed_from(ConstraintViolation);
        let context = logging_context(&fault, &[], true);

        assert_eq!(
            context["trace"],
            json!([
                "duplicate key value violates unique constraint",
                "duplicate key value violates unique constraint"
            ])
        );
        assert_eq!(context["code"], json!("SAVE_FAILED"));
    }

    #[test]
    fn test_extra_contexts_merge_last_write_wins() {
        let fault = AppError::operation_failed("Failed to retrieve records");
        let context = logging_context(
            &fault,
            &[
                extra(json!({"page": 1, "per_page": 20})),
                extra(json!({"per_page": -1, "message": "overridden"})),
            ],
            false,
        );

        assert_eq!(context["page"], json!(1));
        assert_eq!(context["per_page"], json!(-1));
        assert_eq!(context["message"], json!("overridden"));
    }

    #[test]
    fn test_mock_event_log_records_calls() {
        let mut log = MockEventLog::new();
        log.expect_error()
            .withf(|message, context| message == "boom" && context.contains_key("code"))
            .times(1)
            .return_const(());

        let fault = AppError::delete_failed("boom");
        log.error("boom", &logging_context(&fault, &[], true));
    }

    #[test]
    fn test_tracing_log_does_not_panic_without_subscriber() {
        TracingLog.info("hello", &extra(json!({"id": "1"})));
        TracingLog.error("bye", &Attributes::new());
    }
}
