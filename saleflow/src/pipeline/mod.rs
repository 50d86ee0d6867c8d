//! Pipeline construction and execution.
//!
//! A [`Pipeline`] is an ordered list of [`StageSpec`]s that has passed the
//! builder's static checks. [`PipelineRunner`] executes it over a fresh
//! context, one stage at a time.

mod builder;
mod retry;
mod runner;
mod spec;


pub use crate::cancellation::CancellationToken;
pub use builder::PipelineBuilder;
pub use retry::{
    should_retry, with_retry, BackoffStrategy, JitterStrategy, RetryConfig, RetryDecision,
    RetryFailure, RetryState,
};
pub use runner::{PipelineRun, PipelineRunner, RunnerConfig, StageTiming};
pub use spec::{Pipeline, StageSpec};
