//! A stage backed by one text-completion call.

use super::{PromptTemplate, StageExecutor, StageKind};
use crate::context::{ContextValue, ContextView};
use crate::errors::{ProviderError, StageError, StageExecutionError};
use crate::pipeline::{with_retry, RetryConfig};
use crate::providers::CompletionClient;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Renders a prompt from the view and sends it to a completion client.
///
/// Transient provider failures are retried per the configured policy.
/// The reply is returned as text; schema coercion belongs to the runner.
#[derive(Debug, Clone)]
pub struct CompletionStage {
    template: PromptTemplate,
    client: Arc<dyn CompletionClient>,
    retry: RetryConfig,
}

impl CompletionStage {
    /// Creates a completion stage with the default retry policy.
    #[must_use]
    pub fn new(template: PromptTemplate, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            template,
            client,
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
impl StageExecutor for CompletionStage {
    fn kind(&self) -> StageKind {
        StageKind::Completion
    }

    fn reads(&self) -> Vec<String> {
        self.template.context_keys()
    }

    async fn run(&self, view: &ContextView<'_>) -> Result<ContextValue, StageError> {
        let prompt = self.template.render(view)?;
        let stage = view.stage_name();

        let completion = with_retry(&self.retry, stage, ProviderError::is_transient, || {
            self.client.complete(&prompt)
        })
        .await
        .map_err(|failure| StageExecutionError::new(stage, failure.attempts, failure.error))?;

        debug!(
            stage,
            model = %completion.model,
            total_tokens = completion.total_tokens(),
            chars = completion.content.len(),
            "Completion stage finished"
        );
        Ok(ContextValue::Text(completion.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::JitterStrategy;
    use crate::providers::{Completion, MockCompletionClient};

    fn fast_retry() -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(3)
            .with_base_delay_ms(1)
            .with_jitter(JitterStrategy::None)
    }

    #[tokio::test]
    async fn test_renders_prompt_and_returns_text() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .withf(|prompt| prompt == "Diagnose: slow sale")
            .times(1)
            .returning(|_| Ok(Completion::text("Overpriced.")));

        let stage = CompletionStage::new(PromptTemplate::new("Diagnose: {analyst_output}"), Arc::new(client));
        let analysis = ContextValue::text("slow sale");
        let view = ContextView::new("diagnosis", vec![("analyst_output", &analysis)]);

        let value = stage.run(&view).await.unwrap();
        assert_eq!(value.as_text(), Some("Overpriced."));
        assert_eq!(stage.reads(), vec!["analyst_output"]);
        assert_eq!(stage.kind(), StageKind::Completion);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let mut client = MockCompletionClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ProviderError::Timeout));
        client
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Completion::text("ok")));

        let stage = CompletionStage::new(PromptTemplate::new("hi"), Arc::new(client)).with_retry(fast_retry());
        let view = ContextView::new("s", vec![]);

        assert_eq!(stage.run(&view).await.unwrap().as_text(), Some("ok"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_name_stage_and_attempts() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .times(3)
            .returning(|_| Err(ProviderError::RateLimited { retry_after: None }));

        let stage = CompletionStage::new(PromptTemplate::new("hi"), Arc::new(client)).with_retry(fast_retry());
        let view = ContextView::new("strategist", vec![]);

        let err = stage.run(&view).await.unwrap_err();
        match err {
            StageError::Execution(e) => {
                assert_eq!(e.stage_name, "strategist");
                assert_eq!(e.attempts, 3);
                assert_eq!(e.cause, ProviderError::RateLimited { retry_after: None });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(|_| Err(ProviderError::Auth { status: 401 }));

        let stage = CompletionStage::new(PromptTemplate::new("hi"), Arc::new(client)).with_retry(fast_retry());
        let view = ContextView::new("s", vec![]);

        let err = stage.run(&view).await.unwrap_err();
        assert!(matches!(err, StageError::Execution(StageExecutionError { attempts: 1, .. })));
    }
}
