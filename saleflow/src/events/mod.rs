//! Pipeline lifecycle events.
//!
//! The runner reports progress through an [`EventSink`] handed to it at
//! construction. There is no process-wide sink.

mod event;
mod sink;

pub use event::PipelineEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
