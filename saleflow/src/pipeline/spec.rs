//! Stage and pipeline specifications.

use crate::errors::PipelineValidationError;
use crate::schema::{RecordSchema, Schema, StructuredRecord};
use crate::stages::StageExecutor;
use std::collections::HashSet;
use std::sync::Arc;

/// One step of a pipeline: what it reads, what runs, where the result goes.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// Context keys the stage may read, in declaration order.
    pub input_keys: Vec<String>,
    /// The work the stage performs.
    pub executor: Arc<dyn StageExecutor>,
    /// The context key the result is stored under.
    pub output_key: String,
    /// Schema the result is validated against before it is stored.
    pub schema: Option<Arc<dyn RecordSchema>>,
}

impl StageSpec {
    /// Creates a stage whose inputs are exactly what its executor reads.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        executor: Arc<dyn StageExecutor>,
        output_key: impl Into<String>,
    ) -> Self {
        let input_keys = executor.reads();
        Self {
            name: name.into(),
            input_keys,
            executor,
            output_key: output_key.into(),
            schema: None,
        }
    }

    /// Replaces the declared inputs.
    #[must_use]
    pub fn with_inputs(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.input_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the result against `T` before it is stored.
    #[must_use]
    pub fn with_schema<T: StructuredRecord>(mut self) -> Self {
        self.schema = Some(Arc::new(Schema::<T>::new()));
        self
    }

    /// Returns the schema name, if any.
    #[must_use]
    pub fn schema_name(&self) -> Option<&'static str> {
        self.schema.as_ref().map(|s| s.name())
    }

    /// Checks the stage in isolation.
    ///
    /// # Errors
    ///
    /// Returns an error for blank names, repeated inputs, a stage that
    /// reads its own output, or an executor that reads undeclared keys.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-STAGE-NAME",
                "Stage name cannot be empty",
            ));
        }
        if self.output_key.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-OUTPUT-KEY",
                format!("Stage '{}' has an empty output key", self.name),
            )
            .with_stage(&self.name));
        }

        let mut seen = HashSet::new();
        for key in &self.input_keys {
            if !seen.insert(key.as_str()) {
                return Err(PipelineValidationError::new(
                    "PIPELINE-DUPLICATE-INPUT",
                    format!("Stage '{}' declares input '{key}' twice", self.name),
                )
                .with_stage(&self.name));
            }
        }

        if seen.contains(self.output_key.as_str()) {
            return Err(PipelineValidationError::new(
                "PIPELINE-SELF-INPUT",
                format!("Stage '{}' cannot read its own output '{}'", self.name, self.output_key),
            )
            .with_stage(&self.name));
        }

        if let Some(key) = self.executor.reads().into_iter().find(|k| !seen.contains(k.as_str())) {
            return Err(PipelineValidationError::new(
                "PIPELINE-UNDECLARED-READ",
                format!("Stage '{}' reads '{key}' which is not a declared input", self.name),
            )
            .with_stage(&self.name));
        }

        Ok(())
    }
}

/// A validated, immutable sequence of stages.
///
/// Only [`super::PipelineBuilder`] can construct one, so every instance has
/// passed the static dependency checks.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) name: String,
    pub(crate) seed_keys: Vec<String>,
    pub(crate) stages: Vec<StageSpec>,
}

impl Pipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the keys the seed must provide.
    #[must_use]
    pub fn seed_keys(&self) -> &[String] {
        &self.seed_keys
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns every key present after a successful run, in order.
    #[must_use]
    pub fn final_keys(&self) -> Vec<&str> {
        self.seed_keys
            .iter()
            .map(String::as_str)
            .chain(self.stages.iter().map(|s| s.output_key.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;
    use crate::schema::SimulationOutput;
    use crate::stages::TransformStage;

    fn echo(reads: &[&str]) -> Arc<dyn StageExecutor> {
        Arc::new(TransformStage::new("echo", reads, |_| Ok(ContextValue::text("x"))))
    }

    #[test]
    fn test_inputs_default_to_executor_reads() {
        let spec = StageSpec::new("diagnosis", echo(&["analyst_output"]), "diagnosis_output");
        assert_eq!(spec.input_keys, vec!["analyst_output"]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_undeclared_read_rejected() {
        let spec = StageSpec::new("diagnosis", echo(&["analyst_output", "goal"]), "diagnosis_output")
            .with_inputs(["analyst_output"]);

        let err = spec.validate().unwrap_err();
        assert_eq!(err.code, "PIPELINE-UNDECLARED-READ");
        assert_eq!(err.stage.as_deref(), Some("diagnosis"));
    }

    #[test]
    fn test_extra_declared_inputs_allowed() {
        let spec = StageSpec::new("s", echo(&["a"]), "out").with_inputs(["a", "b"]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_self_input_rejected() {
        let spec = StageSpec::new("loop", echo(&["out"]), "out");
        assert_eq!(spec.validate().unwrap_err().code, "PIPELINE-SELF-INPUT");
    }

    #[test]
    fn test_duplicate_input_rejected() {
        let spec = StageSpec::new("s", echo(&[]), "out").with_inputs(["a", "a"]);
        assert_eq!(spec.validate().unwrap_err().code, "PIPELINE-DUPLICATE-INPUT");
    }

    #[test]
    fn test_schema_name() {
        let spec = StageSpec::new("s", echo(&[]), "out").with_schema::<SimulationOutput>();
        assert_eq!(spec.schema_name(), Some("SimulationOutput"));
    }
}
