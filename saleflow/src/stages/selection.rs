//! Deterministic strategy selection and scoring.

use super::{StageExecutor, StageKind};
use crate::context::{ContextValue, ContextView};
use crate::errors::StageError;
use crate::schema::{EvaluatedStrategy, SchemaValidator, SimulationOutput, StrategyEvaluationList};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Largest tolerated gap between a reported overall score and its weighted recomputation.
pub const WEIGHTED_SCORE_TOLERANCE: f64 = 0.5;

/// Ranks evaluated strategies by `overall_score` and scores the top ones.
///
/// Ties keep their evaluation order. The simulation score is the mean of
/// the selected overall scores divided by ten.
#[derive(Debug, Clone)]
pub struct SelectionStage {
    diagnosis_key: String,
    evaluations_key: String,
    top_k: usize,
}

impl SelectionStage {
    /// Creates a selection stage.
    #[must_use]
    pub fn new(diagnosis_key: impl Into<String>, evaluations_key: impl Into<String>, top_k: usize) -> Self {
        Self {
            diagnosis_key: diagnosis_key.into(),
            evaluations_key: evaluations_key.into(),
            top_k,
        }
    }

    /// Returns the number of strategies selected.
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Selects and scores from already-decoded inputs.
    ///
    /// # Errors
    ///
    /// Returns `StageError::InvalidInput` if fewer than `top_k` strategies
    /// were evaluated, or a schema error if the result falls out of bounds.
    pub fn select(
        &self,
        diagnosis: &str,
        list: &StrategyEvaluationList,
    ) -> Result<SimulationOutput, StageError> {
        if self.top_k == 0 || list.evaluations.len() < self.top_k {
            return Err(StageError::InvalidInput(format!(
                "need at least {} evaluated strategies, got {}",
                self.top_k.max(1),
                list.evaluations.len()
            )));
        }

        for strategy in &list.evaluations {
            check_weighted_score(strategy);
        }

        let mut ranked: Vec<&EvaluatedStrategy> = list.evaluations.iter().collect();
        ranked.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        let top = &ranked[..self.top_k];

        #[allow(clippy::cast_precision_loss)]
        let mean = top.iter().map(|s| s.overall_score).sum::<f64>() / top.len() as f64;

        let output = SimulationOutput {
            diagnosis: diagnosis.trim().to_string(),
            strategic_actions: top.iter().map(|s| s.strategy_name.clone()).collect(),
            simulation_score: mean / 10.0,
        };
        SchemaValidator::check(&output)?;

        debug!(
            selected = ?output.strategic_actions,
            simulation_score = output.simulation_score,
            "Strategies selected"
        );
        Ok(output)
    }
}

fn check_weighted_score(strategy: &EvaluatedStrategy) {
    let weighted = strategy.weighted_score();
    if (weighted - strategy.overall_score).abs() > WEIGHTED_SCORE_TOLERANCE {
        warn!(
            strategy = %strategy.strategy_name,
            reported = strategy.overall_score,
            weighted,
            "Reported overall score disagrees with weighted sub-scores"
        );
    }
}

#[async_trait]
impl StageExecutor for SelectionStage {
    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn reads(&self) -> Vec<String> {
        vec![self.diagnosis_key.clone(), self.evaluations_key.clone()]
    }

    async fn run(&self, view: &ContextView<'_>) -> Result<ContextValue, StageError> {
        let diagnosis = view.text(&self.diagnosis_key)?;
        let list: StrategyEvaluationList = view.record(&self.evaluations_key)?;
        let output = self.select(diagnosis, &list)?;
        Ok(ContextValue::record(&output)?)
    }
}
