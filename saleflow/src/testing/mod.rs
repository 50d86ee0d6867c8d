//! Test doubles and fixtures for simulation runs.
//!
//! Public so integration tests and downstream crates can drive the full
//! pipeline without network access.

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_aborted_at, assert_context_keys, assert_event_types, assert_failed_at,
    assert_schema_field,
};
pub use fixtures::{
    market_documents, markers, scripted_completion_client, user_input, ScenarioFixture,
    ANALYST_REPLY, BEHAVIOUR_REPLY, DIAGNOSIS_REPLY, EVALUATION_PARSER_MISSING_FIELD_REPLY,
    EVALUATION_PARSER_REPLY, EVALUATOR_REPLY, EXPECTED_ACTIONS, REPORT_REPLY, SEARCH_QUERY_REPLY,
    STRATEGIST_REPLY,
};
pub use mocks::{FailingSearchClient, ScriptedCompletionClient, StaticSearchClient};
