//! Pipeline builder with static dependency checks.

use super::{Pipeline, StageSpec};
use crate::errors::PipelineValidationError;
use std::collections::{HashMap, HashSet};

/// Builder for creating validated pipelines.
///
/// Stages are appended in execution order. Each stage is checked as it is
/// added: every input key must be a seed key or the output of an earlier
/// stage, and no output key may be produced twice. A pipeline that builds
/// therefore never runs a stage before its inputs exist.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    seed_keys: Vec<String>,
    stages: Vec<StageSpec>,
    /// Key -> producer (`None` for seed keys).
    available: HashMap<String, Option<String>>,
    stage_names: HashSet<String>,
}

impl PipelineBuilder {
    /// Creates a builder for a pipeline seeded with `seed_keys`.
    #[must_use]
    pub fn new(name: impl Into<String>, seed_keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            seed_keys: seed_keys.iter().map(ToString::to_string).collect(),
            stages: Vec::new(),
            available: HashMap::new(),
            stage_names: HashSet::new(),
        }
    }

    /// Adds a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage fails validation.
    pub fn stage(mut self, spec: StageSpec) -> Result<Self, PipelineValidationError> {
        self.add_stage(spec)?;
        Ok(self)
    }

    /// Adds a stage in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage fails validation; the builder is left
    /// unchanged.
    pub fn add_stage(&mut self, spec: StageSpec) -> Result<(), PipelineValidationError> {
        self.check_seed()?;
        spec.validate()?;

        if self.stage_names.contains(&spec.name) {
            return Err(PipelineValidationError::new(
                "PIPELINE-DUPLICATE-STAGE",
                format!("Stage '{}' is defined twice", spec.name),
            )
            .with_stage(&spec.name));
        }

        if let Some(missing) = spec.input_keys.iter().find(|k| !self.available.contains_key(*k)) {
            return Err(PipelineValidationError::new(
                "PIPELINE-MISSING-INPUT",
                format!(
                    "Stage '{}' reads '{missing}' which is neither a seed key nor produced by an earlier stage",
                    spec.name
                ),
            )
            .with_stage(&spec.name));
        }

        if let Some(producer) = self.available.get(&spec.output_key) {
            let by = producer
                .as_deref()
                .map_or_else(|| "the seed".to_string(), |p| format!("stage '{p}'"));
            return Err(PipelineValidationError::new(
                "PIPELINE-DUPLICATE-OUTPUT",
                format!(
                    "Stage '{}' writes '{}' which is already provided by {by}",
                    spec.name, spec.output_key
                ),
            )
            .with_stage(&spec.name));
        }

        self.available
            .insert(spec.output_key.clone(), Some(spec.name.clone()));
        self.stage_names.insert(spec.name.clone());
        self.stages.push(spec);
        Ok(())
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the seed is invalid or there
    /// are no stages.
    pub fn build(mut self) -> Result<Pipeline, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-NAME",
                "Pipeline name cannot be empty or whitespace-only",
            ));
        }
        self.check_seed()?;
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-EMPTY",
                "Pipeline has no stages",
            ));
        }

        Ok(Pipeline {
            name: self.name,
            seed_keys: self.seed_keys,
            stages: self.stages,
        })
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Validates seed keys once and registers them as available.
    fn check_seed(&mut self) -> Result<(), PipelineValidationError> {
        if !self.stages.is_empty() || !self.available.is_empty() {
            return Ok(());
        }
        let mut seen = HashSet::new();
        for key in &self.seed_keys {
            if key.trim().is_empty() {
                return Err(PipelineValidationError::new(
                    "PIPELINE-SEED",
                    "Seed keys cannot be empty",
                ));
            }
            if !seen.insert(key.as_str()) {
                return Err(PipelineValidationError::new(
                    "PIPELINE-SEED",
                    format!("Seed key '{key}' is declared twice"),
                ));
            }
        }
        self.available
            .extend(self.seed_keys.iter().map(|k| (k.clone(), None)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;
    use crate::stages::{StageExecutor, TransformStage};
    use std::sync::Arc;

    fn stage(name: &str, reads: &[&str], output: &str) -> StageSpec {
        let executor: Arc<dyn StageExecutor> =
            Arc::new(TransformStage::new(name, reads, |_| Ok(ContextValue::text("x"))));
        StageSpec::new(name, executor, output)
    }

    #[test]
    fn test_linear_pipeline_builds() {
        let pipeline = PipelineBuilder::new("sim", &["scenario"])
            .stage(stage("analyst", &["scenario"], "analyst_output"))
            .unwrap()
            .stage(stage("diagnosis", &["analyst_output"], "diagnosis_output"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(pipeline.stage_count(), 2);
        assert_eq!(pipeline.final_keys(), vec!["scenario", "analyst_output", "diagnosis_output"]);
    }

    #[test]
    fn test_missing_input_rejected() {
        let err = PipelineBuilder::new("sim", &["scenario"])
            .stage(stage("diagnosis", &["analyst_output"], "diagnosis_output"))
            .unwrap_err();

        assert_eq!(err.code, "PIPELINE-MISSING-INPUT");
        assert_eq!(err.stage.as_deref(), Some("diagnosis"));
    }

    #[test]
    fn test_input_produced_later_is_rejected() {
        let mut builder = PipelineBuilder::new("sim", &["scenario"]);
        let err = builder
            .add_stage(stage("diagnosis", &["analyst_output"], "diagnosis_output"))
            .unwrap_err();
        assert_eq!(err.code, "PIPELINE-MISSING-INPUT");

        builder.add_stage(stage("analyst", &["scenario"], "analyst_output")).unwrap();
        builder.add_stage(stage("diagnosis", &["analyst_output"], "diagnosis_output")).unwrap();
        assert_eq!(builder.stage_count(), 2);
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let err = PipelineBuilder::new("sim", &["scenario"])
            .stage(stage("a", &["scenario"], "out"))
            .unwrap()
            .stage(stage("b", &["scenario"], "out"))
            .unwrap_err();

        assert_eq!(err.code, "PIPELINE-DUPLICATE-OUTPUT");
        assert!(err.message.contains("stage 'a'"));
    }

    #[test]
    fn test_overwriting_seed_rejected() {
        let err = PipelineBuilder::new("sim", &["goal"])
            .stage(stage("a", &["goal"], "goal"))
            .unwrap_err();
        assert_eq!(err.code, "PIPELINE-SELF-INPUT");

        let err = PipelineBuilder::new("sim", &["goal", "scenario"])
            .stage(stage("a", &["scenario"], "goal"))
            .unwrap_err();
        assert_eq!(err.code, "PIPELINE-DUPLICATE-OUTPUT");
        assert!(err.message.contains("the seed"));
    }

    #[test]
    fn test_duplicate_stage_name_rejected() {
        let err = PipelineBuilder::new("sim", &["scenario"])
            .stage(stage("a", &["scenario"], "x"))
            .unwrap()
            .stage(stage("a", &["scenario"], "y"))
            .unwrap_err();
        assert_eq!(err.code, "PIPELINE-DUPLICATE-STAGE");
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineBuilder::new("sim", &["scenario"]).build().unwrap_err();
        assert_eq!(err.code, "PIPELINE-EMPTY");

        let err = PipelineBuilder::new("  ", &["scenario"]).build().unwrap_err();
        assert_eq!(err.code, "PIPELINE-NAME");
    }

    #[test]
    fn test_duplicate_seed_rejected() {
        let err = PipelineBuilder::new("sim", &["goal", "goal"])
            .stage(stage("a", &["goal"], "x"))
            .unwrap_err();
        assert_eq!(err.code, "PIPELINE-SEED");
    }
}
