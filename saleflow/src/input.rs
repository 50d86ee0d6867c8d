//! Loading the seller's input.

use crate::context::{ContextAccumulator, ContextValue};
use crate::errors::InputError;
use crate::schema::UserInput;
use crate::simulation::keys;
use std::path::Path;
use tracing::debug;

impl UserInput {
    /// Creates an input from its three fields.
    #[must_use]
    pub fn new(
        scenario: impl Into<String>,
        goal: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            goal: goal.into(),
            constraint: constraint.into(),
        }
    }

    /// Reads and validates an input file.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the file cannot be read, is not a JSON
    /// object with the three fields, or a field is blank.
    pub async fn from_path(path: &Path) -> Result<Self, InputError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InputError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = raw.len(), "Loaded input file");
        Self::from_json(&raw)
    }

    /// Parses and validates an input document.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Parse` for malformed JSON and
    /// `InputError::EmptyField` for a blank field.
    pub fn from_json(raw: &str) -> Result<Self, InputError> {
        let input: Self = serde_json::from_str(raw).map_err(|e| InputError::Parse(e.to_string()))?;
        input.validate()?;
        Ok(input)
    }

    /// Checks that no field is blank.
    ///
    /// # Errors
    ///
    /// Returns `InputError::EmptyField` naming the first blank field.
    pub fn validate(&self) -> Result<(), InputError> {
        for (name, value) in [
            (keys::SCENARIO, &self.scenario),
            (keys::GOAL, &self.goal),
            (keys::CONSTRAINT, &self.constraint),
        ] {
            if value.trim().is_empty() {
                return Err(InputError::EmptyField(name));
            }
        }
        Ok(())
    }

    /// Builds the seed context for a run.
    ///
    /// # Errors
    ///
    /// Returns `InputError::EmptyField` if a field is blank, or
    /// `InputError::Seed` if the seed repeats a key.
    pub fn to_seed(&self) -> Result<ContextAccumulator, InputError> {
        self.validate()?;
        let seed = ContextAccumulator::seeded([
            (keys::SCENARIO, ContextValue::text(self.scenario.as_str())),
            (keys::GOAL, ContextValue::text(self.goal.as_str())),
            (keys::CONSTRAINT, ContextValue::text(self.constraint.as_str())),
        ])?;
        Ok(seed)
    }
}
