//! Sequential pipeline execution.

use super::{Pipeline, StageSpec};
use crate::cancellation::CancellationToken;
use crate::context::{ContextAccumulator, ContextValue};
use crate::errors::{PipelineError, PipelineValidationError, StageError};
use crate::events::{EventSink, NoOpEventSink, PipelineEvent};
use crate::observability::SpanTimer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Runner settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Deadline for the whole run, measured from its start.
    pub timeout: Option<Duration>,
}

impl RunnerConfig {
    /// Sets the run deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How long one stage took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Stage name.
    pub stage: String,
    /// Key the stage wrote.
    pub output_key: String,
    /// Wall time in milliseconds.
    pub duration_ms: f64,
}

/// The outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// The final context: seed entries followed by one entry per stage.
    pub context: ContextAccumulator,
    /// Per-stage timings in execution order.
    pub timings: Vec<StageTiming>,
}

impl PipelineRun {
    /// Total time spent inside stages.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.timings.iter().map(|t| t.duration_ms).sum()
    }
}

/// Executes pipelines one stage at a time over a private context.
///
/// A stage never starts before every one of its inputs is in the context,
/// and the first failure stops the run. Nothing produced by a failed run
/// is returned.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    events: Arc<dyn EventSink>,
    config: RunnerConfig,
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new(Arc::new(NoOpEventSink))
    }
}

impl PipelineRunner {
    /// Creates a runner reporting to `events`.
    #[must_use]
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            events,
            config: RunnerConfig::default(),
        }
    }

    /// Sets the runner configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a pipeline without external cancellation.
    ///
    /// # Errors
    ///
    /// See [`Self::execute_with_token`].
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        seed: ContextAccumulator,
    ) -> Result<PipelineRun, PipelineError> {
        self.execute_with_token(pipeline, seed, &CancellationToken::new())
            .await
    }

    /// Runs a pipeline, aborting when `token` is cancelled or the deadline passes.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Validation` if the seed keys do not match the
    /// pipeline, `PipelineError::Stage` for the first failing stage, or
    /// `PipelineError::Aborted` naming the stage that was in flight.
    pub async fn execute_with_token(
        &self,
        pipeline: &Pipeline,
        seed: ContextAccumulator,
        token: &CancellationToken,
    ) -> Result<PipelineRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", pipeline = %pipeline.name(), %run_id);
        self.run(pipeline, seed, token, run_id).instrument(span).await
    }

    async fn run(
        &self,
        pipeline: &Pipeline,
        seed: ContextAccumulator,
        token: &CancellationToken,
        run_id: Uuid,
    ) -> Result<PipelineRun, PipelineError> {
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let timer = SpanTimer::start(pipeline.name());

        self.events.emit(&PipelineEvent::PipelineStarted {
            run_id,
            pipeline: pipeline.name().to_string(),
            stage_count: pipeline.stage_count(),
        });
        info!(stages = pipeline.stage_count(), "Pipeline started");

        let result = self.run_stages(pipeline, seed, token, deadline, run_id).await;

        match result {
            Ok((context, timings)) => {
                let duration_ms = timer.elapsed_ms();
                self.events
                    .emit(&PipelineEvent::PipelineCompleted { run_id, duration_ms });
                info!(duration_ms, fingerprint = %context.fingerprint(), "Pipeline completed");
                Ok(PipelineRun {
                    run_id,
                    context,
                    timings,
                })
            }
            Err(err) => {
                self.events.emit(&PipelineEvent::PipelineFailed {
                    run_id,
                    stage: err.stage().map(ToString::to_string),
                    error: err.to_string(),
                    aborted: err.is_aborted(),
                });
                error!(error = %err, "Pipeline failed");
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        pipeline: &Pipeline,
        seed: ContextAccumulator,
        token: &CancellationToken,
        deadline: Option<Instant>,
        run_id: Uuid,
    ) -> Result<(ContextAccumulator, Vec<StageTiming>), PipelineError> {
        check_seed(pipeline, &seed)?;

        let mut context = seed;
        let mut timings = Vec::with_capacity(pipeline.stage_count());

        for spec in pipeline.stages() {
            if token.is_cancelled() {
                return Err(aborted(Some(&spec.name), token));
            }

            self.events.emit(&PipelineEvent::StageStarted {
                run_id,
                stage: spec.name.clone(),
                kind: spec.executor.kind(),
            });
            let timer = SpanTimer::start(&spec.name);

            let outcome = run_stage(spec, &context, token, deadline)
                .instrument(info_span!("stage", stage = %spec.name))
                .await
                .and_then(|value| {
                    context.set(&spec.output_key, value).map_err(|e| PipelineError::Stage {
                        stage: spec.name.clone(),
                        source: e.into(),
                    })
                });
            let duration_ms = timer.elapsed_ms();

            if let Err(err) = outcome {
                self.events.emit(&PipelineEvent::StageFailed {
                    run_id,
                    stage: spec.name.clone(),
                    error: err.to_string(),
                    duration_ms,
                });
                return Err(err);
            }

            self.events.emit(&PipelineEvent::StageCompleted {
                run_id,
                stage: spec.name.clone(),
                output_key: spec.output_key.clone(),
                duration_ms,
            });
            info!(stage = %spec.name, output_key = %spec.output_key, duration_ms, "Stage completed");
            timings.push(StageTiming {
                stage: spec.name.clone(),
                output_key: spec.output_key.clone(),
                duration_ms,
            });
        }

        Ok((context, timings))
    }
}

/// Runs one stage against its view, racing cancellation and the deadline.
async fn run_stage(
    spec: &StageSpec,
    context: &ContextAccumulator,
    token: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<ContextValue, PipelineError> {
    let fail = |source: StageError| PipelineError::Stage {
        stage: spec.name.clone(),
        source,
    };

    let view = context
        .view(&spec.name, &spec.input_keys)
        .map_err(|e| fail(e.into()))?;

    let work = async {
        let value = spec.executor.run(&view).await?;
        let value = match &spec.schema {
            Some(schema) => schema.coerce(value)?,
            None => value,
        };
        Ok::<_, StageError>(value)
    };

    tokio::select! {
        biased;
        () = token.cancelled() => Err(aborted(Some(&spec.name), token)),
        () = until(deadline) => Err(PipelineError::Aborted {
            stage: Some(spec.name.clone()),
            reason: "run deadline exceeded".to_string(),
        }),
        result = work => result.map_err(fail),
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn aborted(stage: Option<&str>, token: &CancellationToken) -> PipelineError {
    PipelineError::Aborted {
        stage: stage.map(ToString::to_string),
        reason: token.reason().unwrap_or_else(|| "cancelled".to_string()),
    }
}

fn check_seed(pipeline: &Pipeline, seed: &ContextAccumulator) -> Result<(), PipelineValidationError> {
    let expected: BTreeSet<&str> = pipeline.seed_keys().iter().map(String::as_str).collect();
    let actual: BTreeSet<&str> = seed.keys().collect();
    if expected == actual {
        return Ok(());
    }

    let missing: Vec<_> = expected.difference(&actual).collect();
    let extra: Vec<_> = actual.difference(&expected).collect();
    Err(PipelineValidationError::new(
        "PIPELINE-SEED-MISMATCH",
        format!("Seed does not match pipeline '{}': missing {missing:?}, unexpected {extra:?}", pipeline.name()),
    ))
}
