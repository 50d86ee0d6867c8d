//! # Saleflow
//!
//! A typed, multi-stage LLM pipeline that simulates strategies for selling
//! a property that is stuck on the market.
//!
//! The crate is built from a few small parts:
//!
//! - **Context**: an append-only, insertion-ordered accumulator of stage
//!   outputs with read-only per-stage views
//! - **Stages**: executors wrapping one completion, search or transform step
//! - **Schema validation**: free-form model text mapped onto declared records
//! - **Pipeline runner**: strict sequential execution with retries,
//!   cancellation and events
//! - **Report**: final synthesis plus JSON and Markdown memo sinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use saleflow::prelude::*;
//!
//! let config = SaleflowConfig::load(None)?;
//! let simulation = Simulation::builder(clients, config).build()?;
//! let input = UserInput::from_path(Path::new("input.json")).await?;
//!
//! let result = simulation.run(&input, &CancellationToken::new()).await?;
//! println!("{:?}", result.simulation.strategic_actions);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod input;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod schema;
pub mod simulation;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{Credentials, SaleflowConfig};
    pub use crate::context::{ContextAccumulator, ContextSnapshot, ContextValue, ContextView, Document};
    pub use crate::errors::{
        AssemblyError, PipelineError, PipelineValidationError, ProviderError, SaleflowError,
        SchemaValidationError, StageError, StageExecutionError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{
        Pipeline, PipelineBuilder, PipelineRun, PipelineRunner, RetryConfig, RunnerConfig, StageSpec,
    };
    pub use crate::providers::{Completion, CompletionClient, SearchClient};
    pub use crate::report::{ReportAssembler, ReportBundle, ReportSink};
    pub use crate::schema::{
        FinalReport, SchemaValidator, SimulationOutput, StrategyEvaluationList, StructuredRecord,
        UserInput,
    };
    pub use crate::simulation::{Clients, Simulation, SimulationResult};
    pub use crate::stages::{PromptTemplate, StageExecutor, StageKind};
}
