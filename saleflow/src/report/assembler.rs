//! The last synthesis call over a finished context.

use crate::context::ContextAccumulator;
use crate::errors::{AssemblyError, ProviderError, StageExecutionError};
use crate::pipeline::{with_retry, RetryConfig};
use crate::providers::CompletionClient;
use crate::schema::{FinalReport, SchemaValidator};
use crate::stages::PromptTemplate;
use std::sync::Arc;
use tracing::{debug, info};

const ASSEMBLER_NAME: &str = "report";

/// Synthesizes a [`FinalReport`] from several context entries.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    template: PromptTemplate,
    client: Arc<dyn CompletionClient>,
    retry: RetryConfig,
}

impl ReportAssembler {
    /// Creates an assembler. The template's context placeholders are the
    /// entries it reads.
    #[must_use]
    pub fn new(template: PromptTemplate, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            template,
            client,
            retry: RetryConfig::default(),
        }
    }

    /// Sets the retry policy for the synthesis call.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the context keys the assembler reads.
    #[must_use]
    pub fn input_keys(&self) -> Vec<String> {
        self.template.context_keys()
    }

    /// Runs the synthesis call and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::Input` if a required entry is missing,
    /// `AssemblyError::Synthesis` if the call fails after retries, and
    /// `AssemblyError::Schema` if the reply is not a valid `FinalReport`.
    pub async fn assemble(&self, context: &ContextAccumulator) -> Result<FinalReport, AssemblyError> {
        let keys = self.input_keys();
        let view = context
            .view(ASSEMBLER_NAME, &keys)
            .map_err(|e| AssemblyError::Input(e.into()))?;
        let prompt = self.template.render(&view).map_err(AssemblyError::Input)?;

        let completion = with_retry(&self.retry, ASSEMBLER_NAME, ProviderError::is_transient, || {
            self.client.complete(&prompt)
        })
        .await
        .map_err(|f| StageExecutionError::new(ASSEMBLER_NAME, f.attempts, f.error))?;
        debug!(chars = completion.content.len(), "Report synthesis returned");

        let report: FinalReport = SchemaValidator::validate(&completion.content)?;
        info!(actions = report.detailed_actions.len(), "Report assembled");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::JitterStrategy;
    use crate::providers::{Completion, MockCompletionClient};
    use crate::errors::StageError;

    fn context() -> ContextAccumulator {
        ContextAccumulator::seeded([
            ("diagnosis_output", "Overpriced for the street."),
            ("behavioural_output", "Stay calm."),
        ])
        .unwrap()
    }

    fn template() -> PromptTemplate {
        PromptTemplate::new("Diagnosis: {diagnosis_output}\nBehaviour: {behavioural_output}\n{format_instructions}")
            .partial("format_instructions", "Return JSON.")
    }

    const REPORT_JSON: &str = r#"{
        "diagnosis_summary": "The asking price is above recent comparables.",
        "detailed_actions": [{"name": "Reprice", "explanation": "Align with comps."}],
        "forecast_analysis": "Score 0.78.",
        "behavioural_commentary": "Negotiate from data."
    }"#;

    #[tokio::test]
    async fn test_assemble_valid_report() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .withf(|prompt| prompt.contains("Overpriced for the street.") && prompt.ends_with("Return JSON."))
            .times(1)
            .returning(|_| Ok(Completion::text(REPORT_JSON)));

        let assembler = ReportAssembler::new(template(), Arc::new(client));
        let report = assembler.assemble(&context()).await.unwrap();

        assert_eq!(report.detailed_actions[0].name, "Reprice");
        assert_eq!(assembler.input_keys(), vec!["diagnosis_output", "behavioural_output"]);
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let assembler = ReportAssembler::new(template(), Arc::new(MockCompletionClient::new()));
        let context = ContextAccumulator::seeded([("diagnosis_output", "x")]).unwrap();

        let err = assembler.assemble(&context).await.unwrap_err();
        assert!(matches!(err, AssemblyError::Input(StageError::MissingKey(_))));
    }

    #[tokio::test]
    async fn test_invalid_report_rejected() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .returning(|_| Ok(Completion::text(r#"{"diagnosis_summary": "x"}"#)));

        let err = ReportAssembler::new(template(), Arc::new(client))
            .assemble(&context())
            .await
            .unwrap_err();

        match err {
            AssemblyError::Schema(e) => assert_eq!(e.field.as_deref(), Some("detailed_actions")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_synthesis_failure_after_retries() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .times(2)
            .returning(|_| Err(ProviderError::Timeout));

        let retry = RetryConfig::new()
            .with_max_attempts(2)
            .with_base_delay_ms(1)
            .with_jitter(JitterStrategy::None);
        let err = ReportAssembler::new(template(), Arc::new(client))
            .with_retry(retry)
            .assemble(&context())
            .await
            .unwrap_err();

        assert!(matches!(err, AssemblyError::Synthesis(StageExecutionError { attempts: 2, .. })));
    }
}
