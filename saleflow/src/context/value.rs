//! Values stored in the pipeline context.

use crate::errors::SchemaValidationError;
use crate::schema::{SchemaValidator, StructuredRecord};
use serde::{Deserialize, Serialize};

/// A document returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The textual content.
    pub content: String,
    /// Page title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Source URL, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Provider relevance score, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Document {
    /// Creates a document with content only.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: None,
            url: None,
            score: None,
        }
    }

    /// Sets the source URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A single context entry: text, retrieved documents, or a validated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContextValue {
    /// Free text (model output or user input).
    Text(String),
    /// Retrieved documents, in provider order.
    Documents(Vec<Document>),
    /// A schema-validated record.
    Record {
        /// The record's schema name.
        schema: String,
        /// The record's serialized form.
        data: serde_json::Value,
    },
}

impl ContextValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Stores a record under its schema name.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` if the record cannot be serialized.
    pub fn record<T: StructuredRecord>(record: &T) -> Result<Self, SchemaValidationError> {
        let data = serde_json::to_value(record).map_err(|e| {
            SchemaValidationError::new(T::SCHEMA, format!("cannot serialize record: {e}"), "")
        })?;
        Ok(Self::Record {
            schema: T::SCHEMA.to_string(),
            data,
        })
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the documents, if this is a documents value.
    #[must_use]
    pub fn as_documents(&self) -> Option<&[Document]> {
        match self {
            Self::Documents(docs) => Some(docs),
            _ => None,
        }
    }

    /// Re-validates and decodes a stored record.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError` if this is not a `T` record or the
    /// stored data no longer conforms.
    pub fn to_record<T: StructuredRecord>(&self) -> Result<T, SchemaValidationError> {
        match self {
            Self::Record { schema, data } if schema == T::SCHEMA => {
                SchemaValidator::validate_value(data)
            }
            Self::Record { schema, .. } => Err(SchemaValidationError::new(
                T::SCHEMA,
                format!("expected a '{}' record, got '{schema}'", T::SCHEMA),
                "",
            )),
            other => Err(SchemaValidationError::new(
                T::SCHEMA,
                format!("expected a record, got {}", other.kind()),
                "",
            )),
        }
    }

    /// A short name for the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Documents(_) => "documents",
            Self::Record { .. } => "record",
        }
    }

    /// Renders the value for interpolation into a prompt.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Documents(docs) => format_docs(docs),
            Self::Record { data, .. } => {
                serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
            }
        }
    }
}

impl From<String> for ContextValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ContextValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<Document>> for ContextValue {
    fn from(docs: Vec<Document>) -> Self {
        Self::Documents(docs)
    }
}

/// Joins documents into one numbered text block.
#[must_use]
pub fn format_docs(docs: &[Document]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| format!("**Source Document {}**:\n{}", i + 1, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
