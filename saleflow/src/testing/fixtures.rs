//! Canned data for the full sale-strategy scenario.

use std::sync::Arc;

use super::mocks::{ScriptedCompletionClient, StaticSearchClient};
use crate::context::Document;
use crate::schema::UserInput;
use crate::simulation::Clients;

/// Phrases identifying each prompt of the simulation.
pub mod markers {
    /// Search query prompt.
    pub const SEARCH_QUERY: &str = "expert at generating web search queries";
    /// Analyst prompt.
    pub const ANALYST: &str = "expert real estate analyst";
    /// Diagnosis prompt.
    pub const DIAGNOSIS: &str = "master diagnostician";
    /// Strategist prompt.
    pub const STRATEGIST: &str = "creative real estate strategist";
    /// Evaluator prompt.
    pub const EVALUATOR: &str = "analytical real estate simulation engine";
    /// Evaluation parser prompt.
    pub const EVALUATION_PARSER: &str = "data extraction agent";
    /// Behaviour prompt.
    pub const BEHAVIOUR: &str = "behavioural psychologist";
    /// Report prompt.
    pub const REPORT: &str = "professional real estate analyst and report writer";
}

/// Generated search query.
pub const SEARCH_QUERY_REPLY: &str =
    "Hartfield three bedroom semi-detached sold prices days on market 2025";

/// Market analysis reply.
pub const ANALYST_REPLY: &str = "Asking price sits 8% above the last three comparable sales. \
Listing photos are dated and the agent has not run an open house in four months.";

/// Diagnosis reply.
pub const DIAGNOSIS_REPLY: &str = "The property is perceived as stale and overpriced for its street.";

/// Four brainstormed strategies.
pub const STRATEGIST_REPLY: &str = "1. Relaunch with new photography and an open house weekend.\n\
2. Switch to a local agent with recent sales on the street.\n\
3. Offer to cover buyer stamp duty above a threshold.\n\
4. Let the property as a short-term rental and relist in spring.";

/// Free-text scores for the four strategies.
pub const EVALUATOR_REPLY: &str = "Strategy 1: impact 8, speed 7, cost/risk 6, overall 7.3.\n\
Strategy 2: impact 9, speed 8, cost/risk 7, overall 8.3.\n\
Strategy 3: impact 7, speed 9, cost/risk 8, overall 7.8.\n\
Strategy 4: impact 5, speed 4, cost/risk 6, overall 4.9.";

/// The structured evaluation reply, fenced the way models return it.
pub const EVALUATION_PARSER_REPLY: &str = r#"Here is the structured evaluation:
```json
{
  "evaluations": [
    {
      "strategy_name": "Relaunch listing",
      "pros": ["Fresh first impression"],
      "cons": ["Photography cost"],
      "impact_score": 8,
      "speed_score": 7,
      "cost_risk_score": 6,
      "overall_score": 7.3
    },
    {
      "strategy_name": "Switch agent",
      "pros": ["Local buyer list"],
      "cons": ["Contract notice period"],
      "impact_score": 9,
      "speed_score": 8,
      "cost_risk_score": 7,
      "overall_score": 8.3
    },
    {
      "strategy_name": "Stamp duty contribution",
      "pros": ["Keeps headline price"],
      "cons": ["Reduces net proceeds"],
      "impact_score": 7,
      "speed_score": 9,
      "cost_risk_score": 8,
      "overall_score": 7.8
    },
    {
      "strategy_name": "Let and relist",
      "pros": ["Rental income"],
      "cons": ["Delays the sale"],
      "impact_score": 5,
      "speed_score": 4,
      "cost_risk_score": 6,
      "overall_score": 4.9
    }
  ]
}
```"#;

/// The same evaluation with `overall_score` missing from the third entry.
pub const EVALUATION_PARSER_MISSING_FIELD_REPLY: &str = r#"```json
{
  "evaluations": [
    {"strategy_name": "Relaunch listing", "pros": [], "cons": [], "impact_score": 8, "speed_score": 7, "cost_risk_score": 6, "overall_score": 7.3},
    {"strategy_name": "Switch agent", "pros": [], "cons": [], "impact_score": 9, "speed_score": 8, "cost_risk_score": 7, "overall_score": 8.3},
    {"strategy_name": "Stamp duty contribution", "pros": [], "cons": [], "impact_score": 7, "speed_score": 9, "cost_risk_score": 8}
  ]
}
```"#;

/// Behavioural commentary reply.
pub const BEHAVIOUR_REPLY: &str =
    "Hold firm on price for two weeks after the relaunch and let the new agent lead viewings.";

/// A fenced `FinalReport`.
pub const REPORT_REPLY: &str = r#"```json
{
  "diagnosis_summary": "The listing has gone stale at a price above recent comparables.",
  "detailed_actions": [
    {"name": "Switch agent", "explanation": "A local agent brings an active buyer list."},
    {"name": "Stamp duty contribution", "explanation": "Improves buyer economics without a price cut."},
    {"name": "Relaunch listing", "explanation": "New photography resets the listing's first impression."}
  ],
  "forecast_analysis": "Switch agent scores 8.3 overall, ahead of the stamp duty offer at 7.8.",
  "behavioural_commentary": "Stay patient through the relaunch window."
}
```"#;

/// Strategy names in the order selection should rank them.
pub const EXPECTED_ACTIONS: [&str; 3] = ["Switch agent", "Stamp duty contribution", "Relaunch listing"];

/// The seller input used across scenario tests.
#[must_use]
pub fn user_input() -> UserInput {
    UserInput::new(
        "Three-bed semi in Hartfield, nine months on market, two price reductions.",
        "Sell within 60 days.",
        "No further price reductions.",
    )
}

/// Search results for the scenario.
#[must_use]
pub fn market_documents() -> Vec<Document> {
    vec![
        Document::new("Semi-detached homes in Hartfield sold in 41 days on average this year.")
            .with_url("https://example.com/hartfield-market"),
        Document::new("Buyers are favouring listings with professional photography.")
            .with_url("https://example.com/listing-trends"),
    ]
}

/// A completion client scripted for every prompt of a successful run.
#[must_use]
pub fn scripted_completion_client() -> ScriptedCompletionClient {
    ScriptedCompletionClient::new()
        .on(markers::SEARCH_QUERY, SEARCH_QUERY_REPLY)
        .on(markers::ANALYST, ANALYST_REPLY)
        .on(markers::DIAGNOSIS, DIAGNOSIS_REPLY)
        .on(markers::STRATEGIST, STRATEGIST_REPLY)
        .on(markers::EVALUATOR, EVALUATOR_REPLY)
        .on(markers::EVALUATION_PARSER, EVALUATION_PARSER_REPLY)
        .on(markers::BEHAVIOUR, BEHAVIOUR_REPLY)
        .on(markers::REPORT, REPORT_REPLY)
}

/// The doubles behind one scenario run, kept for inspection after the run.
#[derive(Debug, Clone)]
pub struct ScenarioFixture {
    /// Completion double shared by stages and report.
    pub completion: Arc<ScriptedCompletionClient>,
    /// Search double.
    pub search: Arc<StaticSearchClient>,
}

impl Default for ScenarioFixture {
    fn default() -> Self {
        Self::new(scripted_completion_client())
    }
}

impl ScenarioFixture {
    /// Uses `completion` with the scenario's search results.
    #[must_use]
    pub fn new(completion: ScriptedCompletionClient) -> Self {
        Self {
            completion: Arc::new(completion),
            search: Arc::new(StaticSearchClient::new(market_documents())),
        }
    }

    /// Returns clients sharing the doubles.
    #[must_use]
    pub fn clients(&self) -> Clients {
        Clients::new(self.completion.clone(), self.search.clone())
    }
}
