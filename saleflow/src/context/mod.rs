//! Context management for pipeline execution.
//!
//! This module provides:
//! - The append-only context accumulator owned by one run
//! - Read-only per-stage projections
//! - Serializable snapshots of finished runs

mod accumulator;
mod snapshot;
mod value;
mod view;

pub use accumulator::ContextAccumulator;
pub use snapshot::{ContextEntry, ContextSnapshot};
pub use value::{format_docs, ContextValue, Document};
pub use view::ContextView;
