//! Domain records produced by the simulation pipeline.

use super::fields::{FieldSpec, StructuredRecord};
use serde::{Deserialize, Serialize};

/// The seller's situation as supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    /// Free-text description of the property and its sale history.
    pub scenario: String,
    /// What the seller wants to achieve.
    pub goal: String,
    /// Hard limits the strategies must respect.
    pub constraint: String,
}

/// One brainstormed strategy with its scored evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedStrategy {
    /// The title of the strategy.
    pub strategy_name: String,
    /// Reasons the strategy might succeed.
    pub pros: Vec<String>,
    /// Risks or failure modes.
    pub cons: Vec<String>,
    /// Potential to achieve the goal (0-10).
    pub impact_score: f64,
    /// How quickly it yields results (0-10).
    pub speed_score: f64,
    /// Low cost and low risk (0-10, 10 = cheap and safe).
    pub cost_risk_score: f64,
    /// The weighted overall score (0-10).
    pub overall_score: f64,
}

impl EvaluatedStrategy {
    /// Weight of the impact score in the overall score.
    pub const IMPACT_WEIGHT: f64 = 0.5;
    /// Weight of the speed score in the overall score.
    pub const SPEED_WEIGHT: f64 = 0.3;
    /// Weight of the cost-risk score in the overall score.
    pub const COST_RISK_WEIGHT: f64 = 0.2;

    /// Recomputes the weighted score from the component scores.
    #[must_use]
    pub fn weighted_score(&self) -> f64 {
        self.impact_score * Self::IMPACT_WEIGHT
            + self.speed_score * Self::SPEED_WEIGHT
            + self.cost_risk_score * Self::COST_RISK_WEIGHT
    }
}

const EVALUATED_STRATEGY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("strategy_name", "The title of the strategy specifying what it's about."),
    FieldSpec::text_list("pros", "Reasons why the strategy might succeed."),
    FieldSpec::text_list("cons", "Potential risks or failures."),
    FieldSpec::number("impact_score", 0.0, 10.0, "Potential to achieve the main goal."),
    FieldSpec::number("speed_score", 0.0, 10.0, "How quickly it will yield results."),
    FieldSpec::number("cost_risk_score", 0.0, 10.0, "Low cost and low risk (10 = very cheap/safe)."),
    FieldSpec::number("overall_score", 0.0, 10.0, "The final weighted overall score."),
];

impl StructuredRecord for EvaluatedStrategy {
    const SCHEMA: &'static str = "EvaluatedStrategy";
    const FIELDS: &'static [FieldSpec] = EVALUATED_STRATEGY_FIELDS;
}

/// All evaluated strategies, in the order the model listed them.
///
/// The order carries no ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyEvaluationList {
    /// The evaluations.
    pub evaluations: Vec<EvaluatedStrategy>,
}

impl StructuredRecord for StrategyEvaluationList {
    const SCHEMA: &'static str = "StrategyEvaluationList";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::records(
        "evaluations",
        EVALUATED_STRATEGY_FIELDS,
        "A list of all evaluated strategies.",
    )];
}

/// The selected strategies and the overall confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// A brief analysis of the property's situation.
    pub diagnosis: String,
    /// The selected strategies, best first.
    pub strategic_actions: Vec<String>,
    /// Confidence in the selected strategies (0-1).
    pub simulation_score: f64,
}

impl StructuredRecord for SimulationOutput {
    const SCHEMA: &'static str = "SimulationOutput";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("diagnosis", "A brief analysis of the property's current situation."),
        FieldSpec::text_list("strategic_actions", "Recommended actions to achieve the goal."),
        FieldSpec::number(
            "simulation_score",
            0.0,
            1.0,
            "Confidence in the strategy's success.",
        ),
    ];
}

/// A recommended action with its rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedAction {
    /// The action.
    pub name: String,
    /// What it involves and why it works.
    pub explanation: String,
}

/// The content of the final report memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    /// What is going wrong with the sale.
    pub diagnosis_summary: String,
    /// The recommended actions.
    pub detailed_actions: Vec<DetailedAction>,
    /// Forecast with the score breakdown for the top strategies.
    pub forecast_analysis: String,
    /// Advice on seller and agent behaviour.
    pub behavioural_commentary: String,
}

impl StructuredRecord for FinalReport {
    const SCHEMA: &'static str = "FinalReport";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text(
            "diagnosis_summary",
            "A clear, concise paragraph explaining what is going wrong with the sale.",
        ),
        FieldSpec::named_pairs("detailed_actions", "The recommended actions."),
        FieldSpec::text(
            "forecast_analysis",
            "The forecast, including the probability of success and why the top strategies score as they do.",
        ),
        FieldSpec::text(
            "behavioural_commentary",
            "Commentary on agent and seller behaviour for the best strategy.",
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_score() {
        let strategy = EvaluatedStrategy {
            strategy_name: "Relaunch".into(),
            pros: vec![],
            cons: vec![],
            impact_score: 8.0,
            speed_score: 6.0,
            cost_risk_score: 5.0,
            overall_score: 6.8,
        };
        assert!((strategy.weighted_score() - 6.8).abs() < 1e-9);
    }

    #[test]
    fn test_user_input_deserialize() {
        let input: UserInput = serde_json::from_str(
            r#"{"scenario": "s", "goal": "g", "constraint": "c"}"#,
        )
        .unwrap();
        assert_eq!(input.goal, "g");
    }
}
