//! The sale-strategy simulation: a ten-stage pipeline plus report synthesis.

mod engine;
mod graph;
pub mod prompts;

pub use engine::{Simulation, SimulationBuilder, SimulationResult, MEMO_FILE, OUTPUT_FILE, SNAPSHOT_FILE};
pub use graph::{build_pipeline, Clients};

/// Context keys used by the simulation pipeline.
pub mod keys {
    /// Seed: the sale scenario.
    pub const SCENARIO: &str = "scenario";
    /// Seed: the seller's goal.
    pub const GOAL: &str = "goal";
    /// Seed: the constraint to respect.
    pub const CONSTRAINT: &str = "constraint";
    /// Generated search query text.
    pub const SEARCH_QUERIES: &str = "search_queries";
    /// Documents returned by the search.
    pub const MARKET_DOCUMENTS: &str = "market_documents";
    /// Documents joined into one text block.
    pub const MARKET_CONTEXT: &str = "market_context";
    /// Market analysis.
    pub const ANALYST_OUTPUT: &str = "analyst_output";
    /// Diagnosis of why the property has not sold.
    pub const DIAGNOSIS_OUTPUT: &str = "diagnosis_output";
    /// Brainstormed strategies.
    pub const STRATEGIST_OUTPUT: &str = "strategist_output";
    /// Free-text strategy evaluation.
    pub const EVALUATION_OUTPUT: &str = "evaluation_output";
    /// Validated `StrategyEvaluationList`.
    pub const STRUCTURED_EVALUATION: &str = "structured_evaluation";
    /// Validated `SimulationOutput`.
    pub const FINAL_STRUCTURED_OUTPUT: &str = "final_structured_output";
    /// Agent and seller behaviour commentary.
    pub const BEHAVIOURAL_OUTPUT: &str = "behavioural_output";

    /// Keys the seed must provide.
    pub const SEED: &[&str] = &[SCENARIO, GOAL, CONSTRAINT];
}
