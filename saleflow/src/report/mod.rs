//! Final report synthesis and artifact sinks.
//!
//! [`ReportAssembler`] turns a finished context into a validated
//! [`FinalReport`](crate::schema::FinalReport). Sinks render the run's
//! results to files; none of them is invoked unless the pipeline and the
//! assembly both succeeded.

mod assembler;
mod json;
mod memo;

pub use assembler::ReportAssembler;
pub use json::{SimulationOutputSink, SnapshotSink};
pub use memo::{MarkdownMemoSink, MemoHeader};

use crate::context::ContextSnapshot;
use crate::errors::SinkError;
use crate::schema::{FinalReport, SimulationOutput};
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Everything a sink may render from one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    /// The run that produced the bundle.
    pub run_id: Uuid,
    /// Selected strategies and score.
    pub simulation: SimulationOutput,
    /// Absent when report synthesis was skipped.
    pub report: Option<FinalReport>,
    /// The final context in execution order.
    pub snapshot: ContextSnapshot,
}

/// Renders a run's results somewhere outside the process.
#[async_trait]
pub trait ReportSink: Send + Sync + Debug {
    /// Writes the artifact, returning its path, or `None` if the bundle
    /// lacks what this sink renders.
    async fn write(&self, bundle: &ReportBundle) -> Result<Option<PathBuf>, SinkError>;
}

pub(crate) async fn write_file(path: &Path, contents: &str) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })
}
