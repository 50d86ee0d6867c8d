//! Field declarations for structured records.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// The declared shape of a single record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// A JSON string.
    Text,
    /// A JSON number within inclusive bounds.
    Number {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// An array of strings.
    TextList,
    /// An array of `{name, explanation}` objects.
    NamedPairs,
    /// An array of nested records.
    RecordList(&'static [FieldSpec]),
}

impl FieldKind {
    /// Short type description used in format instructions.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Text => "string".to_string(),
            Self::Number { min, max } => format!("number between {min} and {max} inclusive"),
            Self::TextList => "array of strings".to_string(),
            Self::NamedPairs => {
                "array of objects with string keys \"name\" and \"explanation\"".to_string()
            }
            Self::RecordList(_) => "array of objects".to_string(),
        }
    }
}

/// A required, named field of a structured record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// The JSON key.
    pub name: &'static str,
    /// The declared shape.
    pub kind: FieldKind,
    /// What the field holds, for prompts.
    pub description: &'static str,
}

impl FieldSpec {
    /// Declares a text field.
    #[must_use]
    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            description,
        }
    }

    /// Declares a bounded numeric field.
    #[must_use]
    pub const fn number(name: &'static str, min: f64, max: f64, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Number { min, max },
            description,
        }
    }

    /// Declares a list-of-text field.
    #[must_use]
    pub const fn text_list(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::TextList,
            description,
        }
    }

    /// Declares a list of `{name, explanation}` pairs.
    #[must_use]
    pub const fn named_pairs(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::NamedPairs,
            description,
        }
    }

    /// Declares a list of nested records.
    #[must_use]
    pub const fn records(
        name: &'static str,
        fields: &'static [FieldSpec],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::RecordList(fields),
            description,
        }
    }
}

/// A typed record that model output is validated into.
///
/// `FIELDS` must list every required field of the serde representation;
/// the validator checks them before decoding so errors can name the field.
pub trait StructuredRecord:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static
{
    /// The schema name reported in errors and stored with context records.
    const SCHEMA: &'static str;

    /// The declared fields.
    const FIELDS: &'static [FieldSpec];
}
