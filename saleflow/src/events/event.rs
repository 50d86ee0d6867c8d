//! Event payloads.

use crate::stages::StageKind;
use serde::Serialize;
use uuid::Uuid;

/// A lifecycle event emitted by the pipeline runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum PipelineEvent {
    #[serde(rename = "pipeline.started")]
    PipelineStarted {
        run_id: Uuid,
        pipeline: String,
        stage_count: usize,
    },

    #[serde(rename = "stage.started")]
    StageStarted {
        run_id: Uuid,
        stage: String,
        kind: StageKind,
    },

    #[serde(rename = "stage.completed")]
    StageCompleted {
        run_id: Uuid,
        stage: String,
        output_key: String,
        duration_ms: f64,
    },

    #[serde(rename = "stage.failed")]
    StageFailed {
        run_id: Uuid,
        stage: String,
        error: String,
        duration_ms: f64,
    },

    #[serde(rename = "pipeline.completed")]
    PipelineCompleted { run_id: Uuid, duration_ms: f64 },

    #[serde(rename = "pipeline.failed")]
    PipelineFailed {
        run_id: Uuid,
        stage: Option<String>,
        error: String,
        aborted: bool,
    },
}

impl PipelineEvent {
    /// Returns the dotted event name, e.g. `stage.completed`.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PipelineStarted { .. } => "pipeline.started",
            Self::StageStarted { .. } => "stage.started",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFailed { .. } => "stage.failed",
            Self::PipelineCompleted { .. } => "pipeline.completed",
            Self::PipelineFailed { .. } => "pipeline.failed",
        }
    }

    /// Returns the run this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::PipelineStarted { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::StageCompleted { run_id, .. }
            | Self::StageFailed { run_id, .. }
            | Self::PipelineCompleted { run_id, .. }
            | Self::PipelineFailed { run_id, .. } => *run_id,
        }
    }

    /// Returns the stage this event concerns, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageStarted { stage, .. }
            | Self::StageCompleted { stage, .. }
            | Self::StageFailed { stage, .. } => Some(stage),
            Self::PipelineFailed { stage, .. } => stage.as_deref(),
            Self::PipelineStarted { .. } | Self::PipelineCompleted { .. } => None,
        }
    }
}
