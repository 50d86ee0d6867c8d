//! Construction of the simulation pipeline.

use super::{keys, prompts};
use crate::config::SaleflowConfig;
use crate::errors::PipelineValidationError;
use crate::pipeline::{Pipeline, PipelineBuilder, StageSpec};
use crate::providers::{CompletionClient, SearchClient};
use crate::schema::{SchemaValidator, SimulationOutput, StrategyEvaluationList};
use crate::stages::{CompletionStage, PromptTemplate, SearchStage, SelectionStage, TransformStage};
use chrono::NaiveDate;
use std::sync::Arc;

/// The external services a simulation talks to.
#[derive(Debug, Clone)]
pub struct Clients {
    /// Completion service for the pipeline stages.
    pub completion: Arc<dyn CompletionClient>,
    /// Completion service for report synthesis.
    pub report: Arc<dyn CompletionClient>,
    /// Search service for market context.
    pub search: Arc<dyn SearchClient>,
}

impl Clients {
    /// Uses one completion client for both stages and report.
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionClient>, search: Arc<dyn SearchClient>) -> Self {
        Self {
            report: Arc::clone(&completion),
            completion,
            search,
        }
    }

    /// Uses a separate client for report synthesis.
    #[must_use]
    pub fn with_report_client(mut self, report: Arc<dyn CompletionClient>) -> Self {
        self.report = report;
        self
    }
}

pub(crate) fn date_partial(today: NaiveDate) -> String {
    today.format("%A, %d %B %Y").to_string()
}

/// Builds the ten-stage simulation pipeline.
///
/// # Errors
///
/// Returns `PipelineValidationError` if the stage graph fails its static
/// checks, e.g. a prompt reading a key its stage did not declare.
pub fn build_pipeline(
    clients: &Clients,
    config: &SaleflowConfig,
    today: NaiveDate,
) -> Result<Pipeline, PipelineValidationError> {
    let date = date_partial(today);
    let completion = |template: PromptTemplate| -> Arc<CompletionStage> {
        Arc::new(
            CompletionStage::new(template, Arc::clone(&clients.completion))
                .with_retry(config.retry.clone()),
        )
    };

    PipelineBuilder::new("sale_strategy_simulation", keys::SEED)
        .stage(
            StageSpec::new(
                "search_query",
                completion(PromptTemplate::new(prompts::SEARCH_QUERY).partial("current_date", &date)),
                keys::SEARCH_QUERIES,
            )
            .with_inputs([keys::SCENARIO]),
        )?
        .stage(
            StageSpec::new(
                "market_search",
                Arc::new(
                    SearchStage::new(
                        keys::SEARCH_QUERIES,
                        Arc::clone(&clients.search),
                        config.search.max_results,
                    )
                    .with_retry(config.retry.clone()),
                ),
                keys::MARKET_DOCUMENTS,
            )
            .with_inputs([keys::SEARCH_QUERIES]),
        )?
        .stage(
            StageSpec::new(
                "market_context",
                Arc::new(TransformStage::format_documents(keys::MARKET_DOCUMENTS)),
                keys::MARKET_CONTEXT,
            )
            .with_inputs([keys::MARKET_DOCUMENTS]),
        )?
        .stage(
            StageSpec::new("analyst", completion(PromptTemplate::new(prompts::ANALYST)), keys::ANALYST_OUTPUT)
                .with_inputs([keys::MARKET_CONTEXT, keys::SCENARIO, keys::GOAL, keys::CONSTRAINT]),
        )?
        .stage(
            StageSpec::new("diagnosis", completion(PromptTemplate::new(prompts::DIAGNOSIS)), keys::DIAGNOSIS_OUTPUT)
                .with_inputs([keys::ANALYST_OUTPUT]),
        )?
        .stage(
            StageSpec::new("strategist", completion(PromptTemplate::new(prompts::STRATEGIST)), keys::STRATEGIST_OUTPUT)
                .with_inputs([keys::DIAGNOSIS_OUTPUT, keys::ANALYST_OUTPUT]),
        )?
        .stage(
            StageSpec::new(
                "evaluator",
                completion(PromptTemplate::new(prompts::EVALUATOR).partial("current_date", &date)),
                keys::EVALUATION_OUTPUT,
            )
            .with_inputs([keys::DIAGNOSIS_OUTPUT, keys::STRATEGIST_OUTPUT]),
        )?
        .stage(
            StageSpec::new(
                "evaluation_parser",
                completion(PromptTemplate::new(prompts::EVALUATION_PARSER).partial(
                    "format_instructions",
                    SchemaValidator::format_instructions::<StrategyEvaluationList>(),
                )),
                keys::STRUCTURED_EVALUATION,
            )
            .with_inputs([keys::EVALUATION_OUTPUT])
            .with_schema::<StrategyEvaluationList>(),
        )?
        .stage(
            StageSpec::new(
                "selection",
                Arc::new(SelectionStage::new(
                    keys::DIAGNOSIS_OUTPUT,
                    keys::STRUCTURED_EVALUATION,
                    config.selection.top_k,
                )),
                keys::FINAL_STRUCTURED_OUTPUT,
            )
            .with_inputs([keys::DIAGNOSIS_OUTPUT, keys::STRUCTURED_EVALUATION])
            .with_schema::<SimulationOutput>(),
        )?
        .stage(
            StageSpec::new("behaviour", completion(PromptTemplate::new(prompts::BEHAVIOUR)), keys::BEHAVIOURAL_OUTPUT)
                .with_inputs([keys::DIAGNOSIS_OUTPUT, keys::FINAL_STRUCTURED_OUTPUT]),
        )?
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::StageKind;
    use crate::testing::{ScriptedCompletionClient, StaticSearchClient};
    use pretty_assertions::assert_eq;

    fn clients() -> Clients {
        Clients::new(
            Arc::new(ScriptedCompletionClient::new()),
            Arc::new(StaticSearchClient::new(Vec::new())),
        )
    }

    #[test]
    fn test_stage_graph() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 24).unwrap();
        let pipeline = build_pipeline(&clients(), &SaleflowConfig::default(), today).unwrap();

        let outputs: Vec<&str> = pipeline.stages().iter().map(|s| s.output_key.as_str()).collect();
        assert_eq!(
            outputs,
            vec![
                "search_queries",
                "market_documents",
                "market_context",
                "analyst_output",
                "diagnosis_output",
                "strategist_output",
                "evaluation_output",
                "structured_evaluation",
                "final_structured_output",
                "behavioural_output",
            ]
        );

        let kinds: Vec<StageKind> = pipeline.stages().iter().map(|s| s.executor.kind()).collect();
        assert_eq!(kinds[1], StageKind::Search);
        assert_eq!(kinds[2], StageKind::Transform);
        assert_eq!(kinds[8], StageKind::Transform);

        let parser = pipeline.stage("evaluation_parser").unwrap();
        assert_eq!(parser.schema_name(), Some("StrategyEvaluationList"));
        assert_eq!(pipeline.stage("selection").unwrap().schema_name(), Some("SimulationOutput"));
    }

    #[test]
    fn test_date_partial() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 24).unwrap();
        assert_eq!(date_partial(today), "Thursday, 24 July 2025");
    }

    #[test]
    fn test_prompts_only_read_declared_inputs() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 24).unwrap();
        let pipeline = build_pipeline(&clients(), &SaleflowConfig::default(), today).unwrap();

        for stage in pipeline.stages() {
            for key in stage.executor.reads() {
                assert!(stage.input_keys.contains(&key), "{} reads {key}", stage.name);
            }
        }
    }
}
