//! Assertions over run results and events.

use crate::context::ContextAccumulator;
use crate::errors::PipelineError;
use crate::events::CollectingEventSink;

/// Asserts that the context holds exactly `expected` keys, in order.
pub fn assert_context_keys(context: &ContextAccumulator, expected: &[&str]) {
    let actual: Vec<&str> = context.keys().collect();
    assert_eq!(actual, expected, "Context keys differ from expected order");
}

/// Asserts that the sink recorded exactly `expected` event types, in order.
pub fn assert_event_types(sink: &CollectingEventSink, expected: &[&str]) {
    assert_eq!(sink.event_types(), expected, "Unexpected event sequence");
}

/// Asserts that the run failed in `stage` and was not aborted.
pub fn assert_failed_at(err: &PipelineError, stage: &str) {
    assert!(!err.is_aborted(), "Expected a stage failure, got abort: {err}");
    assert_eq!(err.stage(), Some(stage), "Failure named the wrong stage: {err}");
}

/// Asserts that the run was aborted while `stage` was in flight.
pub fn assert_aborted_at(err: &PipelineError, stage: &str) {
    assert!(err.is_aborted(), "Expected an abort, got: {err}");
    assert_eq!(err.stage(), Some(stage), "Abort named the wrong stage: {err}");
}

/// Asserts that the schema failure names `field`.
pub fn assert_schema_field(err: &PipelineError, field: &str) {
    let schema = err
        .schema_error()
        .unwrap_or_else(|| panic!("Expected a schema failure, got: {err}"));
    assert_eq!(schema.field.as_deref(), Some(field), "Schema failure named the wrong field");
}
