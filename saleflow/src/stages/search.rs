//! A stage backed by one search call.

use super::{StageExecutor, StageKind};
use crate::context::{ContextValue, ContextView};
use crate::errors::{ProviderError, StageError, StageExecutionError};
use crate::pipeline::{with_retry, RetryConfig};
use crate::providers::SearchClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends the text under `query_key` to a search client as one query.
#[derive(Debug, Clone)]
pub struct SearchStage {
    query_key: String,
    client: Arc<dyn SearchClient>,
    max_results: usize,
    retry: RetryConfig,
}

impl SearchStage {
    /// Creates a search stage reading its query from `query_key`.
    #[must_use]
    pub fn new(query_key: impl Into<String>, client: Arc<dyn SearchClient>, max_results: usize) -> Self {
        Self {
            query_key: query_key.into(),
            client,
            max_results,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl StageExecutor for SearchStage {
    fn kind(&self) -> StageKind {
        StageKind::Search
    }

    fn reads(&self) -> Vec<String> {
        vec![self.query_key.clone()]
    }

    async fn run(&self, view: &ContextView<'_>) -> Result<ContextValue, StageError> {
        let query = view.text(&self.query_key)?.trim();
        if query.is_empty() {
            return Err(StageError::InvalidInput(format!("'{}' is empty", self.query_key)));
        }
        let stage = view.stage_name();

        let documents = with_retry(&self.retry, stage, ProviderError::is_transient, || {
            self.client.search(query, self.max_results)
        })
        .await
        .map_err(|failure| StageExecutionError::new(stage, failure.attempts, failure.error))?;

        if documents.is_empty() {
            warn!(stage, "Search returned no documents");
        }
        debug!(stage, documents = documents.len(), "Search stage finished");
        Ok(ContextValue::Documents(documents))
    }
}
