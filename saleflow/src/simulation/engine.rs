//! The simulation facade: pipeline, report synthesis and artifact sinks.

use super::graph::{build_pipeline, Clients};
use super::{keys, prompts};
use crate::cancellation::CancellationToken;
use crate::config::SaleflowConfig;
use crate::errors::{AssemblyError, PipelineError, PipelineValidationError, SaleflowError};
use crate::events::{EventSink, NoOpEventSink};
use crate::pipeline::{Pipeline, PipelineRun, PipelineRunner, RunnerConfig};
use crate::report::{
    MarkdownMemoSink, MemoHeader, ReportAssembler, ReportBundle, ReportSink, SimulationOutputSink,
    SnapshotSink,
};
use crate::schema::{FinalReport, SchemaValidator, SimulationOutput, UserInput};
use crate::stages::PromptTemplate;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// File name of the `SimulationOutput` artifact.
pub const OUTPUT_FILE: &str = "output.json";
/// File name of the context snapshot artifact.
pub const SNAPSHOT_FILE: &str = "final_result.json";
/// File name of the Markdown memo.
pub const MEMO_FILE: &str = "simulation_memo.md";

const REPORT_STAGE: &str = "report";

/// Everything a successful simulation produced.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The pipeline run, including the final context.
    pub run: PipelineRun,
    /// The selected strategies and confidence score.
    pub simulation: SimulationOutput,
    /// The synthesized report, unless synthesis was disabled.
    pub report: Option<FinalReport>,
    /// Files written by the sinks.
    pub artifacts: Vec<PathBuf>,
}

/// Configures a [`Simulation`].
#[derive(Debug)]
pub struct SimulationBuilder {
    clients: Clients,
    config: SaleflowConfig,
    today: Option<NaiveDate>,
    events: Arc<dyn EventSink>,
    sinks: Option<Vec<Arc<dyn ReportSink>>>,
    report: bool,
}

impl SimulationBuilder {
    /// Creates a builder with the default sinks under `config.output_dir`.
    #[must_use]
    pub fn new(clients: Clients, config: SaleflowConfig) -> Self {
        Self {
            clients,
            config,
            today: None,
            events: Arc::new(NoOpEventSink),
            sinks: None,
            report: true,
        }
    }

    /// Pins the date used in prompts and the memo.
    #[must_use]
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Reports pipeline events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Adds a sink. The first call replaces the default sinks.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.get_or_insert_with(Vec::new).push(sink);
        self
    }

    /// Writes no artifacts.
    #[must_use]
    pub fn without_sinks(mut self) -> Self {
        self.sinks = Some(Vec::new());
        self
    }

    /// Skips report synthesis.
    #[must_use]
    pub fn without_report(mut self) -> Self {
        self.report = false;
        self
    }

    /// Validates the configuration and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `SaleflowError::Config` for invalid settings and
    /// `SaleflowError::Pipeline` if the stage graph fails its static checks.
    pub fn build(self) -> Result<Simulation, SaleflowError> {
        self.config.validate()?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let pipeline = build_pipeline(&self.clients, &self.config, today).map_err(PipelineError::from)?;

        let assembler = if self.report {
            let assembler = ReportAssembler::new(
                PromptTemplate::new(prompts::REPORT).partial(
                    "format_instructions",
                    SchemaValidator::format_instructions::<FinalReport>(),
                ),
                Arc::clone(&self.clients.report),
            )
            .with_retry(self.config.retry.clone());
            check_report_inputs(&pipeline, &assembler).map_err(PipelineError::from)?;
            Some(assembler)
        } else {
            None
        };

        let sinks = self.sinks.unwrap_or_else(|| default_sinks(&self.config, today));
        let timeout = self.config.run_timeout();
        let mut runner_config = RunnerConfig::default();
        if let Some(timeout) = timeout {
            runner_config = runner_config.with_timeout(timeout);
        }

        Ok(Simulation {
            pipeline,
            runner: PipelineRunner::new(self.events).with_config(runner_config),
            assembler,
            sinks,
            timeout,
        })
    }
}

fn default_sinks(config: &SaleflowConfig, today: NaiveDate) -> Vec<Arc<dyn ReportSink>> {
    let dir = &config.output_dir;
    vec![
        Arc::new(SimulationOutputSink::new(dir.join(OUTPUT_FILE))),
        Arc::new(SnapshotSink::new(dir.join(SNAPSHOT_FILE))),
        Arc::new(
            MarkdownMemoSink::new(dir.join(MEMO_FILE), MemoHeader::from(&config.report)).with_date(today),
        ),
    ]
}

fn check_report_inputs(pipeline: &Pipeline, assembler: &ReportAssembler) -> Result<(), PipelineValidationError> {
    let produced = pipeline.final_keys();
    for key in assembler.input_keys() {
        if !produced.contains(&key.as_str()) {
            return Err(PipelineValidationError::new(
                "REPORT-MISSING-INPUT",
                format!("Report reads '{key}' which the pipeline never produces"),
            ));
        }
    }
    Ok(())
}

/// A configured sale-strategy simulation.
///
/// Runs the pipeline, synthesizes the report and hands both to the sinks.
/// Sinks only run after everything before them succeeded, and a failing
/// sink removes the files written before it.
#[derive(Debug)]
pub struct Simulation {
    pipeline: Pipeline,
    runner: PipelineRunner,
    assembler: Option<ReportAssembler>,
    sinks: Vec<Arc<dyn ReportSink>>,
    timeout: Option<Duration>,
}

impl Simulation {
    /// Starts configuring a simulation.
    #[must_use]
    pub fn builder(clients: Clients, config: SaleflowConfig) -> SimulationBuilder {
        SimulationBuilder::new(clients, config)
    }

    /// Returns the pipeline this simulation runs.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs the simulation for one input.
    ///
    /// # Errors
    ///
    /// Returns `SaleflowError::Input` for a blank input field,
    /// `SaleflowError::Pipeline` if a stage fails or the run is aborted, and
    /// `SaleflowError::Assembly` if the report cannot be built or written.
    pub async fn run(
        &self,
        input: &UserInput,
        token: &CancellationToken,
    ) -> Result<SimulationResult, SaleflowError> {
        let seed = input.to_seed()?;
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let run = self
            .runner
            .execute_with_token(&self.pipeline, seed, token)
            .await?;

        let simulation: SimulationOutput = run
            .context
            .get(keys::FINAL_STRUCTURED_OUTPUT)
            .map_err(|e| AssemblyError::Input(e.into()))?
            .to_record()
            .map_err(AssemblyError::from)?;

        let report = match &self.assembler {
            Some(assembler) => Some(
                assemble(assembler, &run, token, deadline)
                    .instrument(info_span!("report", run_id = %run.run_id))
                    .await?,
            ),
            None => None,
        };

        let bundle = ReportBundle {
            run_id: run.run_id,
            simulation: simulation.clone(),
            report: report.clone(),
            snapshot: run.context.snapshot(),
        };
        let artifacts = self.write_artifacts(&bundle).await?;

        info!(
            run_id = %run.run_id,
            simulation_score = simulation.simulation_score,
            actions = simulation.strategic_actions.len(),
            "Simulation completed"
        );
        Ok(SimulationResult {
            run,
            simulation,
            report,
            artifacts,
        })
    }

    /// Runs every sink, removing what was already written if one fails.
    async fn write_artifacts(&self, bundle: &ReportBundle) -> Result<Vec<PathBuf>, AssemblyError> {
        let mut artifacts = Vec::new();
        for sink in &self.sinks {
            match sink.write(bundle).await {
                Ok(Some(path)) => {
                    info!(path = %path.display(), "Artifact written");
                    artifacts.push(path);
                }
                Ok(None) => {}
                Err(err) => {
                    discard(&artifacts).await;
                    return Err(err.into());
                }
            }
        }
        Ok(artifacts)
    }
}

async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove partial artifact");
        }
    }
}

async fn assemble(
    assembler: &ReportAssembler,
    run: &PipelineRun,
    token: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<FinalReport, SaleflowError> {
    let aborted = |reason: String| -> SaleflowError {
        PipelineError::Aborted {
            stage: Some(REPORT_STAGE.to_string()),
            reason,
        }
        .into()
    };

    tokio::select! {
        biased;
        () = token.cancelled() => Err(aborted(token.reason().unwrap_or_else(|| "cancelled".to_string()))),
        () = until(deadline) => Err(aborted("run deadline exceeded".to_string())),
        report = assembler.assemble(&run.context) => Ok(report?),
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
