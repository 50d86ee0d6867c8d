//! Schema validation of model output into typed records.

use super::extract::extract_json;
use super::fields::{FieldKind, FieldSpec, StructuredRecord};
use crate::errors::SchemaValidationError;
use serde_json::Value;
use std::fmt::Write as _;

/// Validates free-form text against a [`StructuredRecord`] schema.
///
/// Validation is a pure function of the text and the schema. Bounded
/// numbers outside their range are rejected, never clamped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Extracts, checks and decodes a record from raw model text.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` if no JSON object is found, a
    /// required field is missing or mistyped, or a bound is violated.
    pub fn validate<T: StructuredRecord>(raw_text: &str) -> Result<T, SchemaValidationError> {
        let value = extract_json(raw_text)
            .map_err(|reason| SchemaValidationError::new(T::SCHEMA, reason, raw_text))?;
        Self::decode(&value, raw_text)
    }

    /// Checks and decodes an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` under the same rules as [`Self::validate`].
    pub fn validate_value<T: StructuredRecord>(value: &Value) -> Result<T, SchemaValidationError> {
        Self::decode(value, &value.to_string())
    }

    /// Checks a record that was built in code rather than parsed.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` if the record violates its schema.
    pub fn check<T: StructuredRecord>(record: &T) -> Result<(), SchemaValidationError> {
        let value = serde_json::to_value(record).map_err(|e| {
            SchemaValidationError::new(T::SCHEMA, format!("cannot serialize record: {e}"), "")
        })?;
        check_object(T::SCHEMA, T::FIELDS, &value, "", &value.to_string())
    }

    /// Renders instructions describing the expected JSON shape.
    #[must_use]
    pub fn format_instructions<T: StructuredRecord>() -> String {
        let mut out = String::from(
            "Respond with a single JSON object inside a ```json code block. \
             All fields are required:\n",
        );
        render_fields(&mut out, T::FIELDS, 0);
        out.push_str("Numbers must be plain JSON numbers within the stated bounds.");
        out
    }

    fn decode<T: StructuredRecord>(value: &Value, raw: &str) -> Result<T, SchemaValidationError> {
        check_object(T::SCHEMA, T::FIELDS, value, "", raw)?;
        serde_json::from_value(value.clone()).map_err(|e| {
            SchemaValidationError::new(T::SCHEMA, format!("cannot decode record: {e}"), raw)
        })
    }
}

fn render_fields(out: &mut String, fields: &[FieldSpec], depth: usize) {
    let indent = "  ".repeat(depth + 1);
    for field in fields {
        let _ = writeln!(
            out,
            "{indent}- \"{}\" ({}): {}",
            field.name,
            field.kind.describe(),
            field.description
        );
        if let FieldKind::RecordList(nested) = field.kind {
            render_fields(out, nested, depth + 1);
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_object(
    schema: &str,
    fields: &[FieldSpec],
    value: &Value,
    prefix: &str,
    raw: &str,
) -> Result<(), SchemaValidationError> {
    let Some(object) = value.as_object() else {
        return Err(if prefix.is_empty() {
            SchemaValidationError::new(schema, "expected a JSON object", raw)
        } else {
            SchemaValidationError::for_field(schema, prefix, "expected an object", raw)
        });
    };

    for field in fields {
        let path = join_path(prefix, field.name);
        let Some(field_value) = object.get(field.name).filter(|v| !v.is_null()) else {
            return Err(SchemaValidationError::for_field(
                schema,
                path,
                "required field is missing",
                raw,
            ));
        };
        check_field(schema, field, field_value, &path, raw)?;
    }
    Ok(())
}

fn check_field(
    schema: &str,
    field: &FieldSpec,
    value: &Value,
    path: &str,
    raw: &str,
) -> Result<(), SchemaValidationError> {
    let mismatch = |expected: &str| {
        SchemaValidationError::for_field(
            schema,
            path,
            format!("expected {expected}, got {}", json_type(value)),
            raw,
        )
    };

    match field.kind {
        FieldKind::Text => {
            value.as_str().ok_or_else(|| mismatch("a string"))?;
        }
        FieldKind::Number { min, max } => {
            let number = value.as_f64().ok_or_else(|| mismatch("a number"))?;
            if number < min || number > max {
                return Err(SchemaValidationError::for_field(
                    schema,
                    path,
                    format!("value {number} is outside [{min}, {max}]"),
                    raw,
                ));
            }
        }
        FieldKind::TextList => {
            let items = value.as_array().ok_or_else(|| mismatch("an array"))?;
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(SchemaValidationError::for_field(
                        schema,
                        format!("{path}[{i}]"),
                        format!("expected a string, got {}", json_type(item)),
                        raw,
                    ));
                }
            }
        }
        FieldKind::NamedPairs => {
            let items = value.as_array().ok_or_else(|| mismatch("an array"))?;
            for (i, item) in items.iter().enumerate() {
                check_object(schema, NAMED_PAIR_FIELDS, item, &format!("{path}[{i}]"), raw)?;
            }
        }
        FieldKind::RecordList(nested) => {
            let items = value.as_array().ok_or_else(|| mismatch("an array"))?;
            for (i, item) in items.iter().enumerate() {
                check_object(schema, nested, item, &format!("{path}[{i}]"), raw)?;
            }
        }
    }
    Ok(())
}

const NAMED_PAIR_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", "short name"),
    FieldSpec::text("explanation", "explanation"),
];

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        DetailedAction, EvaluatedStrategy, FinalReport, SimulationOutput, StrategyEvaluationList,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn strategy_json(name: &str, impact: f64, overall: f64) -> Value {
        json!({
            "strategy_name": name,
            "pros": ["fresh exposure"],
            "cons": ["fees"],
            "impact_score": impact,
            "speed_score": 6,
            "cost_risk_score": 7.5,
            "overall_score": overall,
        })
    }

    #[test]
    fn test_validate_simulation_output_from_prose() {
        let raw = "Here you go:\n```json\n{\"diagnosis\": \"Overpriced\", \
                   \"strategic_actions\": [\"a\", \"b\", \"c\"], \"simulation_score\": 0.72}\n```";

        let output: SimulationOutput = SchemaValidator::validate(raw).unwrap();
        assert_eq!(output.diagnosis, "Overpriced");
        assert_eq!(output.strategic_actions.len(), 3);
        assert!((output.simulation_score - 0.72).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_score_rejected_not_clamped() {
        let raw = json!({"evaluations": [strategy_json("Reprice", 11.0, 8.0)]}).to_string();

        let err = SchemaValidator::validate::<StrategyEvaluationList>(&raw).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("evaluations[0].impact_score"));
        assert!(err.reason.contains("outside [0, 10]"));
    }

    #[test]
    fn test_simulation_score_upper_bound() {
        let raw = r#"{"diagnosis": "x", "strategic_actions": [], "simulation_score": 1.2}"#;
        let err = SchemaValidator::validate::<SimulationOutput>(raw).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("simulation_score"));
    }

    #[test]
    fn test_negative_score_rejected() {
        let raw = json!({"evaluations": [strategy_json("Reprice", -0.5, 8.0)]}).to_string();
        assert!(SchemaValidator::validate::<StrategyEvaluationList>(&raw).is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let raw = json!({"evaluations": [strategy_json("Edge", 10.0, 0.0)]}).to_string();
        let list: StrategyEvaluationList = SchemaValidator::validate(&raw).unwrap();
        assert!((list.evaluations[0].impact_score - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut strategy = strategy_json("Reprice", 8.0, 7.5);
        strategy.as_object_mut().unwrap().remove("overall_score");
        let raw = json!({"evaluations": [strategy_json("Stage", 5.0, 5.0), strategy]}).to_string();

        let err = SchemaValidator::validate::<StrategyEvaluationList>(&raw).unwrap_err();
        assert_eq!(err.schema, "StrategyEvaluationList");
        assert_eq!(err.field.as_deref(), Some("evaluations[1].overall_score"));
        assert_eq!(err.reason, "required field is missing");
    }

    #[test]
    fn test_null_counts_as_missing() {
        let raw = r#"{"diagnosis": null, "strategic_actions": [], "simulation_score": 0.1}"#;
        let err = SchemaValidator::validate::<SimulationOutput>(raw).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("diagnosis"));
    }

    #[test]
    fn test_textual_score_rejected() {
        let mut strategy = strategy_json("Reprice", 8.0, 7.5);
        strategy["overall_score"] = json!("7.5/10");
        let raw = json!({"evaluations": [strategy]}).to_string();

        let err = SchemaValidator::validate::<StrategyEvaluationList>(&raw).unwrap_err();
        assert_eq!(err.reason, "expected a number, got a string");
    }

    #[test]
    fn test_list_item_type_checked() {
        let raw = r#"{"diagnosis": "x", "strategic_actions": ["a", 2], "simulation_score": 0.5}"#;
        let err = SchemaValidator::validate::<SimulationOutput>(raw).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("strategic_actions[1]"));
    }

    #[test]
    fn test_named_pairs_checked() {
        let raw = json!({
            "diagnosis_summary": "s",
            "detailed_actions": [{"name": "Reprice"}],
            "forecast_analysis": "f",
            "behavioural_commentary": "b",
        })
        .to_string();

        let err = SchemaValidator::validate::<FinalReport>(&raw).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("detailed_actions[0].explanation"));
    }

    #[test]
    fn test_unparsable_text() {
        let err = SchemaValidator::validate::<SimulationOutput>("I could not decide.").unwrap_err();
        assert!(err.field.is_none());
        assert_eq!(err.reason, "no JSON object found");
        assert_eq!(err.raw_snippet, "I could not decide.");
    }

    #[test]
    fn test_extra_fields_ignored() {
        let raw = r#"{"diagnosis": "x", "strategic_actions": [], "simulation_score": 0.5, "note": 1}"#;
        assert!(SchemaValidator::validate::<SimulationOutput>(raw).is_ok());
    }

    #[test]
    fn test_round_trip_final_report() {
        let report = FinalReport {
            diagnosis_summary: "Stale listing after repeated cuts.".into(),
            detailed_actions: vec![DetailedAction {
                name: "Relaunch with new agent".into(),
                explanation: "Resets market perception.".into(),
            }],
            forecast_analysis: "Score 0.74".into(),
            behavioural_commentary: "Hold firm on floor price.".into(),
        };

        let text = serde_json::to_string_pretty(&report).unwrap();
        let again: FinalReport = SchemaValidator::validate(&text).unwrap();
        assert_eq!(again, report);
    }

    #[test]
    fn test_round_trip_evaluations() {
        let list = StrategyEvaluationList {
            evaluations: vec![EvaluatedStrategy {
                strategy_name: "Reposition guide to £4.25M".into(),
                pros: vec!["anchors buyers".into()],
                cons: vec!["signals weakness".into()],
                impact_score: 8.0,
                speed_score: 7.0,
                cost_risk_score: 6.5,
                overall_score: 7.4,
            }],
        };

        let value = serde_json::to_value(&list).unwrap();
        let again: StrategyEvaluationList = SchemaValidator::validate_value(&value).unwrap();
        assert_eq!(again, list);
    }

    #[test]
    fn test_check_built_record() {
        let output = SimulationOutput {
            diagnosis: "x".into(),
            strategic_actions: vec![],
            simulation_score: 1.5,
        };
        assert!(SchemaValidator::check(&output).is_err());
    }

    #[test]
    fn test_format_instructions_mention_bounds() {
        let text = SchemaValidator::format_instructions::<StrategyEvaluationList>();
        assert!(text.contains("\"evaluations\""));
        assert!(text.contains("\"impact_score\" (number between 0 and 10 inclusive)"));
    }
}
