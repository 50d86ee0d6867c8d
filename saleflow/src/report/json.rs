//! JSON artifact sinks.

use super::{write_file, ReportBundle, ReportSink};
use crate::errors::SinkError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

fn to_pretty<T: Serialize>(value: &T) -> Result<String, SinkError> {
    serde_json::to_string_pretty(value).map_err(|e| SinkError::Serialization(e.to_string()))
}

/// Writes the `SimulationOutput` record as pretty JSON.
#[derive(Debug, Clone)]
pub struct SimulationOutputSink {
    path: PathBuf,
}

impl SimulationOutputSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReportSink for SimulationOutputSink {
    async fn write(&self, bundle: &ReportBundle) -> Result<Option<PathBuf>, SinkError> {
        write_file(&self.path, &to_pretty(&bundle.simulation)?).await?;
        Ok(Some(self.path.clone()))
    }
}

/// Writes the ordered context snapshot of the run as pretty JSON.
#[derive(Debug, Clone)]
pub struct SnapshotSink {
    path: PathBuf,
}

impl SnapshotSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Serialize)]
struct SnapshotFile<'a> {
    run_id: String,
    #[serde(flatten)]
    snapshot: &'a crate::context::ContextSnapshot,
}

#[async_trait]
impl ReportSink for SnapshotSink {
    async fn write(&self, bundle: &ReportBundle) -> Result<Option<PathBuf>, SinkError> {
        let file = SnapshotFile {
            run_id: bundle.run_id.to_string(),
            snapshot: &bundle.snapshot,
        };
        write_file(&self.path, &to_pretty(&file)?).await?;
        Ok(Some(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextAccumulator, ContextSnapshot};
    use crate::schema::SimulationOutput;
    use uuid::Uuid;

    fn bundle() -> ReportBundle {
        let context = ContextAccumulator::seeded([("scenario", "x"), ("goal", "y")]).unwrap();
        ReportBundle {
            run_id: Uuid::nil(),
            simulation: SimulationOutput {
                diagnosis: "Overpriced".into(),
                strategic_actions: vec!["Reprice".into()],
                simulation_score: 0.75,
            },
            report: None,
            snapshot: context.snapshot(),
        }
    }

    #[tokio::test]
    async fn test_simulation_output_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SimulationOutputSink::new(dir.path().join("out/output.json"));

        let path = sink.write(&bundle()).await.unwrap().unwrap();
        let written: SimulationOutput =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, bundle().simulation);
    }

    #[tokio::test]
    async fn test_snapshot_sink_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SnapshotSink::new(dir.path().join("final_result.json"));

        let path = sink.write(&bundle()).await.unwrap().unwrap();
        let raw = std::fs::read_to_string(path).unwrap();
        let snapshot: ContextSnapshot = serde_json::from_str(&raw).unwrap();

        let keys: Vec<_> = snapshot.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["scenario", "goal"]);
        assert!(raw.contains("00000000-0000-0000-0000-000000000000"));
    }
}
