//! Structured records and their validation.
//!
//! This module provides:
//! - Field declarations for typed records
//! - Extraction of JSON from free-form model output
//! - The schema validator and format instructions
//! - Type-erased schema checks attached to stages

mod extract;
mod fields;
mod records;
mod validator;

pub use extract::extract_json;
pub use fields::{FieldKind, FieldSpec, StructuredRecord};
pub use records::{
    DetailedAction, EvaluatedStrategy, FinalReport, SimulationOutput, StrategyEvaluationList,
    UserInput,
};
pub use validator::SchemaValidator;

use crate::context::ContextValue;
use crate::errors::SchemaValidationError;
use std::fmt::Debug;
use std::marker::PhantomData;

/// A schema a stage declares for its output.
///
/// The runner passes every value the stage returns through `coerce`.
pub trait RecordSchema: Send + Sync + Debug {
    /// The schema name.
    fn name(&self) -> &'static str;

    /// Validates a stage output, turning raw text into a record.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` if the value does not conform.
    fn coerce(&self, value: ContextValue) -> Result<ContextValue, SchemaValidationError>;
}

/// The [`RecordSchema`] for a concrete record type.
pub struct Schema<T>(PhantomData<fn() -> T>);

impl<T: StructuredRecord> Schema<T> {
    /// Creates the schema handle.
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: StructuredRecord> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Schema<T>
where
    T: StructuredRecord,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Schema").field(&T::SCHEMA).finish()
    }
}

impl<T: StructuredRecord> RecordSchema for Schema<T> {
    fn name(&self) -> &'static str {
        T::SCHEMA
    }

    fn coerce(&self, value: ContextValue) -> Result<ContextValue, SchemaValidationError> {
        let record: T = match value {
            ContextValue::Text(raw) => SchemaValidator::validate(&raw)?,
            ContextValue::Record { schema, data } => {
                if schema != T::SCHEMA {
                    return Err(SchemaValidationError::new(
                        T::SCHEMA,
                        format!("expected a '{}' record, got '{schema}'", T::SCHEMA),
                        &data.to_string(),
                    ));
                }
                SchemaValidator::validate_value(&data)?
            }
            ContextValue::Documents(_) => {
                return Err(SchemaValidationError::new(
                    T::SCHEMA,
                    "expected text or a record, got documents",
                    "",
                ));
            }
        };
        ContextValue::record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_coerces_text() {
        let schema = Schema::<SimulationOutput>::new();
        let raw = r#"{"diagnosis": "d", "strategic_actions": ["a"], "simulation_score": 0.4}"#;

        let value = schema.coerce(ContextValue::Text(raw.into())).unwrap();
        let record: SimulationOutput = value.to_record().unwrap();
        assert_eq!(record.strategic_actions, vec!["a".to_string()]);
        assert_eq!(schema.name(), "SimulationOutput");
    }

    #[test]
    fn test_schema_rejects_wrong_record() {
        let value = ContextValue::Record {
            schema: "Other".into(),
            data: serde_json::json!({}),
        };
        let err = Schema::<SimulationOutput>::new().coerce(value).unwrap_err();
        assert!(err.reason.contains("got 'Other'"));
    }

    #[test]
    fn test_schema_rejects_documents() {
        let err = Schema::<FinalReport>::new()
            .coerce(ContextValue::Documents(Vec::new()))
            .unwrap_err();
        assert_eq!(err.schema, "FinalReport");
    }
}
