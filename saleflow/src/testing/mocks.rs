//! Test doubles for the completion and search services.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::Document;
use crate::errors::ProviderError;
use crate::providers::{Completion, CompletionClient, SearchClient};

#[derive(Debug, Clone)]
struct ScriptEntry {
    marker: String,
    response: String,
    failures: Vec<ProviderError>,
}

/// A completion client that answers from a script.
///
/// Each entry pairs a marker phrase with a reply. A prompt receives the
/// reply of the first entry whose marker it contains. Failures queued for
/// an entry are returned, one per call, before the reply is.
#[derive(Debug, Default)]
pub struct ScriptedCompletionClient {
    script: Mutex<Vec<ScriptEntry>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletionClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reply for prompts containing `marker`.
    #[must_use]
    pub fn on(self, marker: impl Into<String>, response: impl Into<String>) -> Self {
        self.script.lock().push(ScriptEntry {
            marker: marker.into(),
            response: response.into(),
            failures: Vec::new(),
        });
        self
    }

    /// Replaces the reply for `marker`, keeping its position.
    #[must_use]
    pub fn replace(self, marker: &str, response: impl Into<String>) -> Self {
        if let Some(entry) = self.script.lock().iter_mut().find(|e| e.marker == marker) {
            entry.response = response.into();
        }
        self
    }

    /// Fails the next `times` calls for `marker` with `error`.
    #[must_use]
    pub fn fail_times(self, marker: &str, times: usize, error: ProviderError) -> Self {
        if let Some(entry) = self.script.lock().iter_mut().find(|e| e.marker == marker) {
            entry.failures.extend(std::iter::repeat(error).take(times));
        }
        self
    }

    /// Returns every prompt received, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Returns the total number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Returns how many prompts contained `marker`.
    #[must_use]
    pub fn calls_matching(&self, marker: &str) -> usize {
        self.prompts.lock().iter().filter(|p| p.contains(marker)).count()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError> {
        self.prompts.lock().push(prompt.to_string());

        let mut script = self.script.lock();
        let entry = script
            .iter_mut()
            .find(|e| prompt.contains(&e.marker))
            .ok_or_else(|| ProviderError::InvalidResponse("no scripted reply for prompt".to_string()))?;

        if entry.failures.is_empty() {
            Ok(Completion::text(entry.response.clone()))
        } else {
            Err(entry.failures.remove(0))
        }
    }
}

/// A search client returning a fixed document set.
#[derive(Debug, Default)]
pub struct StaticSearchClient {
    documents: Vec<Document>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticSearchClient {
    /// Creates a client that always returns `documents`.
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Returns each query received with its requested result count.
    #[must_use]
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchClient for StaticSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, ProviderError> {
        self.queries.lock().push((query.to_string(), max_results));
        Ok(self.documents.iter().take(max_results).cloned().collect())
    }
}

/// A search client that always fails.
#[derive(Debug)]
pub struct FailingSearchClient {
    error: ProviderError,
    calls: Mutex<usize>,
}

impl FailingSearchClient {
    /// Creates a client failing every call with `error`.
    #[must_use]
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl SearchClient for FailingSearchClient {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<Document>, ProviderError> {
        *self.calls.lock() += 1;
        Err(self.error.clone())
    }
}
