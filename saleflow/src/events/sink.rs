//! Event sink trait and implementations.

use super::PipelineEvent;
use std::fmt::Debug;
use tracing::{debug, info, Level};

/// Receives pipeline events.
///
/// Emission never fails and never blocks the run; a sink that cannot
/// deliver an event drops it.
pub trait EventSink: Send + Sync + Debug {
    /// Emits an event.
    fn emit(&self, event: &PipelineEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// A sink that logs events through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at the given level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        let data = serde_json::to_string(event).unwrap_or_default();
        if self.level == Level::DEBUG {
            debug!(
                event_type = event.event_type(),
                run_id = %event.run_id(),
                event_data = %data,
                "Event: {}", event.event_type()
            );
        } else {
            info!(
                event_type = event.event_type(),
                run_id = %event.run_id(),
                event_data = %data,
                "Event: {}", event.event_type()
            );
        }
    }
}

/// A sink that keeps every event, for tests and post-run inspection.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event names in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.read().iter().map(PipelineEvent::event_type).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns the stages that emitted `stage.started`, in order.
    #[must_use]
    pub fn started_stages(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::StageStarted { stage, .. } => Some(stage.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::StageKind;
    use uuid::Uuid;

    fn started(stage: &str) -> PipelineEvent {
        PipelineEvent::StageStarted {
            run_id: Uuid::nil(),
            stage: stage.to_string(),
            kind: StageKind::Completion,
        }
    }

    #[test]
    fn test_noop_and_logging_sinks_accept_events() {
        NoOpEventSink.emit(&started("a"));
        LoggingEventSink::default().emit(&started("a"));
        LoggingEventSink::debug().emit(&started("a"));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&started("analyst"));
        sink.emit(&PipelineEvent::PipelineCompleted {
            run_id: Uuid::nil(),
            duration_ms: 1.0,
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["stage.started", "pipeline.completed"]);
        assert_eq!(sink.started_stages(), vec!["analyst"]);
    }
}
