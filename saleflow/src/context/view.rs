//! Read-only projection of the context handed to a stage.

use super::value::{ContextValue, Document};
use crate::errors::{StageError, UndeclaredKeyError};
use crate::schema::StructuredRecord;

/// The subset of the context a stage declared as its inputs.
///
/// Reading any other key fails with `UndeclaredKeyError`.
#[derive(Debug, Clone)]
pub struct ContextView<'a> {
    stage: &'a str,
    entries: Vec<(&'a str, &'a ContextValue)>,
}

impl<'a> ContextView<'a> {
    /// Creates a view over already-resolved entries.
    #[must_use]
    pub fn new(stage: &'a str, entries: Vec<(&'a str, &'a ContextValue)>) -> Self {
        Self { stage, entries }
    }

    /// Returns the name of the stage this view was built for.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        self.stage
    }

    /// Gets a declared value.
    ///
    /// # Errors
    ///
    /// Returns `UndeclaredKeyError` if the key is not part of the view.
    pub fn get(&self, key: &str) -> Result<&'a ContextValue, UndeclaredKeyError> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| UndeclaredKeyError::new(self.stage, key))
    }

    /// Gets a declared text value.
    ///
    /// # Errors
    ///
    /// Returns a `StageError` if the key is undeclared or not text.
    pub fn text(&self, key: &str) -> Result<&'a str, StageError> {
        let value = self.get(key)?;
        value
            .as_text()
            .ok_or_else(|| StageError::InvalidInput(format!("'{key}' is {}, not text", value.kind())))
    }

    /// Gets declared documents.
    ///
    /// # Errors
    ///
    /// Returns a `StageError` if the key is undeclared or not documents.
    pub fn documents(&self, key: &str) -> Result<&'a [Document], StageError> {
        let value = self.get(key)?;
        value.as_documents().ok_or_else(|| {
            StageError::InvalidInput(format!("'{key}' is {}, not documents", value.kind()))
        })
    }

    /// Gets and re-validates a declared record.
    ///
    /// # Errors
    ///
    /// Returns a `StageError` if the key is undeclared or not a valid `T`.
    pub fn record<T: StructuredRecord>(&self, key: &str) -> Result<T, StageError> {
        Ok(self.get(key)?.to_record()?)
    }

    /// Returns the declared keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Returns the number of declared entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the stage declared no inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
