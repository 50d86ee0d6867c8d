//! Serializable dump of a finished run's context.

use super::value::ContextValue;
use serde::{Deserialize, Serialize};

/// One key/value pair of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// The context key.
    pub key: String,
    /// The stored value.
    pub value: ContextValue,
}

/// The ordered contents of a context, for caching and inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Entries in insertion order.
    pub entries: Vec<ContextEntry>,
}

impl ContextSnapshot {
    /// Looks up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }
}
