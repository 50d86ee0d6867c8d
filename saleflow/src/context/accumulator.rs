//! The append-only context threaded through a pipeline run.

use super::snapshot::{ContextEntry, ContextSnapshot};
use super::value::ContextValue;
use super::view::ContextView;
use crate::errors::{DuplicateKeyError, MissingKeyError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// The running state of a single pipeline run.
///
/// Keys are written once and never overwritten. Iteration follows
/// insertion order, which is execution order. One run owns one instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextAccumulator {
    entries: Vec<(String, ContextValue)>,
    index: HashMap<String, usize>,
}

impl ContextAccumulator {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context seeded with initial entries.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKeyError` if the seed repeats a key.
    pub fn seeded<K, V>(seed: impl IntoIterator<Item = (K, V)>) -> Result<Self, DuplicateKeyError>
    where
        K: Into<String>,
        V: Into<ContextValue>,
    {
        let mut ctx = Self::new();
        for (key, value) in seed {
            ctx.set(key, value.into())?;
        }
        Ok(ctx)
    }

    /// Gets a value.
    ///
    /// # Errors
    ///
    /// Returns `MissingKeyError` if the key is absent.
    pub fn get(&self, key: &str) -> Result<&ContextValue, MissingKeyError> {
        self.index
            .get(key)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| MissingKeyError::new(key))
    }

    /// Sets a value under a new key.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKeyError` if the key already exists.
    pub fn set(&mut self, key: impl Into<String>, value: ContextValue) -> Result<(), DuplicateKeyError> {
        let key = key.into();
        if self.index.contains_key(&key) {
            return Err(DuplicateKeyError::new(key));
        }

        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a read-only projection over the given keys for a stage.
    ///
    /// # Errors
    ///
    /// Returns `MissingKeyError` for the first key that is absent.
    pub fn view<'a>(
        &'a self,
        stage: &'a str,
        keys: &'a [String],
    ) -> Result<ContextView<'a>, MissingKeyError> {
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            entries.push((key.as_str(), self.get(key)?));
        }
        Ok(ContextView::new(stage, entries))
    }

    /// Captures the context as a serializable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            entries: self
                .entries
                .iter()
                .map(|(key, value)| ContextEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    /// Returns a SHA-256 hex digest of the ordered entries.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in &self.entries {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            let encoded = serde_json::to_vec(value).unwrap_or_default();
            hasher.update(&encoded);
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

impl TryFrom<ContextSnapshot> for ContextAccumulator {
    type Error = DuplicateKeyError;

    fn try_from(snapshot: ContextSnapshot) -> Result<Self, Self::Error> {
        Self::seeded(snapshot.entries.into_iter().map(|e| (e.key, e.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> ContextAccumulator {
        ContextAccumulator::seeded([
            ("scenario", "On market 9 months"),
            ("goal", "Sell within 60 days"),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let mut ctx = ContextAccumulator::new();
        ctx.set("key", ContextValue::text("value")).unwrap();

        assert_eq!(ctx.get("key").unwrap().as_text(), Some("value"));
        assert!(ctx.contains_key("key"));
        assert!(!ctx.contains_key("other"));
    }

    #[test]
    fn test_duplicate_key_never_overwrites() {
        let mut ctx = seeded();
        let err = ctx.set("goal", ContextValue::text("Sell at any price")).unwrap_err();

        assert_eq!(err.key, "goal");
        assert_eq!(ctx.get("goal").unwrap().as_text(), Some("Sell within 60 days"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_duplicate_in_seed() {
        let result = ContextAccumulator::seeded([("a", "1"), ("a", "2")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_key() {
        let ctx = seeded();
        let err = ctx.get("diagnosis_output").unwrap_err();
        assert_eq!(err.key, "diagnosis_output");
    }

    #[test]
    fn test_insertion_order() {
        let mut ctx = seeded();
        ctx.set("analyst_output", ContextValue::text("a")).unwrap();
        ctx.set("diagnosis_output", ContextValue::text("d")).unwrap();

        let keys: Vec<_> = ctx.keys().collect();
        assert_eq!(keys, vec!["scenario", "goal", "analyst_output", "diagnosis_output"]);
    }

    #[test]
    fn test_view_projects_declared_keys() {
        let ctx = seeded();
        let keys = vec!["goal".to_string()];
        let view = ctx.view("diagnosis", &keys).unwrap();

        assert_eq!(view.text("goal").unwrap(), "Sell within 60 days");
        assert!(view.get("scenario").is_err());
    }

    #[test]
    fn test_view_missing_key() {
        let ctx = seeded();
        let keys = vec!["constraint".to_string()];
        assert_eq!(ctx.view("s", &keys).unwrap_err().key, "constraint");
    }

    #[test]
    fn test_fingerprint_is_stable_and_order_sensitive() {
        let a = ContextAccumulator::seeded([("x", "1"), ("y", "2")]).unwrap();
        let b = ContextAccumulator::seeded([("x", "1"), ("y", "2")]).unwrap();
        let c = ContextAccumulator::seeded([("y", "2"), ("x", "1")]).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let ctx = seeded();
        let json = serde_json::to_string(&ctx.snapshot()).unwrap();
        let snapshot: ContextSnapshot = serde_json::from_str(&json).unwrap();

        let restored = ContextAccumulator::try_from(snapshot).unwrap();
        assert_eq!(restored, ctx);
    }
}
