//! Error types for the saleflow pipeline.
//!
//! Every failure a run can produce maps onto one of these types. Stage-level
//! errors are wrapped into [`PipelineError`] with the failing stage's name,
//! and [`SaleflowError`] is the single top-level type the facade returns.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of characters kept from raw model output in errors.
pub const RAW_SNIPPET_LIMIT: usize = 200;

/// The top-level error type for saleflow operations.
#[derive(Debug, Error)]
pub enum SaleflowError {
    /// The pipeline failed or was aborted.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// The final report could not be assembled or written.
    #[error("{0}")]
    Assembly(#[from] AssemblyError),

    /// The user input could not be loaded.
    #[error("{0}")]
    Input(#[from] InputError),

    /// The configuration is invalid or incomplete.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Error raised when model output does not conform to a declared schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("schema '{schema}' rejected {}: {reason}", target(.field))]
pub struct SchemaValidationError {
    /// The schema that was being validated.
    pub schema: String,
    /// The offending field path, if the failure is field-specific.
    pub field: Option<String>,
    /// Why validation failed.
    pub reason: String,
    /// A bounded prefix of the raw text that failed.
    pub raw_snippet: String,
}

impl SchemaValidationError {
    /// Creates a new schema validation error.
    #[must_use]
    pub fn new(schema: impl Into<String>, reason: impl Into<String>, raw: &str) -> Self {
        Self {
            schema: schema.into(),
            field: None,
            reason: reason.into(),
            raw_snippet: snippet(raw),
        }
    }

    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn for_field(
        schema: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
        raw: &str,
    ) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::new(schema, reason, raw)
        }
    }
}

fn target(field: &Option<String>) -> String {
    field
        .as_deref()
        .map_or_else(|| "output".to_string(), |f| format!("field '{f}'"))
}

const ELLIPSIS: &str = "...";

/// Truncates raw text to at most [`RAW_SNIPPET_LIMIT`] characters, ellipsis included.
#[must_use]
pub fn snippet(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= RAW_SNIPPET_LIMIT {
        return trimmed.to_string();
    }
    let keep = RAW_SNIPPET_LIMIT - ELLIPSIS.len();
    let end = trimmed.char_indices().nth(keep).map_or(trimmed.len(), |(idx, _)| idx);
    format!("{}{ELLIPSIS}", &trimmed[..end])
}

/// Failure reported by an external provider (completion or search).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The provider asked us to slow down.
    #[error("rate limited by provider")]
    RateLimited {
        /// Server-suggested wait, if any.
        retry_after: Option<Duration>,
    },

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials were rejected.
    #[error("authentication failed (status {status})")]
    Auth {
        /// The HTTP status code.
        status: u16,
    },

    /// Any other non-success HTTP status.
    #[error("provider returned status {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// A bounded prefix of the response body.
        body: String,
    },

    /// The provider answered but the payload was unusable.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited { .. } | Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Auth { .. } | Self::InvalidResponse(_) => false,
        }
    }

    /// Creates an HTTP error from a status and body, classifying auth failures.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Auth { status },
            429 => Self::RateLimited { retry_after: None },
            _ => Self::Http {
                status,
                body: snippet(body),
            },
        }
    }
}

/// Error raised when a stage's external call fails after all retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage '{stage_name}' failed after {attempts} attempt(s): {cause}")]
pub struct StageExecutionError {
    /// The failing stage.
    pub stage_name: String,
    /// Number of calls made.
    pub attempts: usize,
    /// The last provider failure.
    #[source]
    pub cause: ProviderError,
}

impl StageExecutionError {
    /// Creates a new stage execution error.
    #[must_use]
    pub fn new(stage_name: impl Into<String>, attempts: usize, cause: ProviderError) -> Self {
        Self {
            stage_name: stage_name.into(),
            attempts,
            cause,
        }
    }
}

/// Error raised when reading a key that is not in the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("context has no key '{key}'")]
pub struct MissingKeyError {
    /// The missing key.
    pub key: String,
}

impl MissingKeyError {
    /// Creates a new missing key error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Error raised when writing a key that is already in the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("context key '{key}' is already set")]
pub struct DuplicateKeyError {
    /// The conflicting key.
    pub key: String,
}

impl DuplicateKeyError {
    /// Creates a new duplicate key error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Error raised when a stage reads a key it did not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage '{stage}' read undeclared key '{key}'")]
pub struct UndeclaredKeyError {
    /// The reading stage.
    pub stage: String,
    /// The undeclared key.
    pub key: String,
}

impl UndeclaredKeyError {
    /// Creates a new undeclared key error.
    #[must_use]
    pub fn new(stage: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            key: key.into(),
        }
    }
}

/// Any failure a single stage can return.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// The external call failed after retries.
    #[error("{0}")]
    Execution(#[from] StageExecutionError),

    /// The stage output did not match its schema.
    #[error("{0}")]
    Schema(#[from] SchemaValidationError),

    /// A declared input was absent.
    #[error("{0}")]
    MissingKey(#[from] MissingKeyError),

    /// The output key was already present.
    #[error("{0}")]
    DuplicateKey(#[from] DuplicateKeyError),

    /// The stage read outside its projection.
    #[error("{0}")]
    UndeclaredKey(#[from] UndeclaredKeyError),

    /// An input had the wrong shape or content.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Error raised when a pipeline definition fails its static checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// Stable error code (e.g. `PIPELINE-MISSING-INPUT`).
    pub code: &'static str,
    /// The error message.
    pub message: String,
    /// The stage involved, if any.
    pub stage: Option<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stage: None,
        }
    }

    /// Sets the stage involved.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(ref stage) = self.stage {
            map.insert("stage".to_string(), serde_json::json!(stage));
        }
        map
    }
}

/// Error returned by a pipeline run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The pipeline or its seed failed static validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage failed; nothing after it ran.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        /// The failing stage.
        stage: String,
        /// The underlying failure.
        #[source]
        source: StageError,
    },

    /// The run was cancelled or hit its deadline.
    #[error("pipeline aborted{}: {reason}", during(.stage))]
    Aborted {
        /// The stage in flight when the abort happened.
        stage: Option<String>,
        /// Why the run was aborted.
        reason: String,
    },
}

fn during(stage: &Option<String>) -> String {
    stage
        .as_deref()
        .map(|s| format!(" during stage '{s}'"))
        .unwrap_or_default()
}

impl PipelineError {
    /// Returns the failing stage, if the error is attributable to one.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Validation(err) => err.stage.as_deref(),
            Self::Stage { stage, .. } => Some(stage),
            Self::Aborted { stage, .. } => stage.as_deref(),
        }
    }

    /// Returns the schema error behind a stage failure, if any.
    #[must_use]
    pub fn schema_error(&self) -> Option<&SchemaValidationError> {
        match self {
            Self::Stage {
                source: StageError::Schema(err),
                ..
            } => Some(err),
            _ => None,
        }
    }

    /// Whether the run was aborted rather than failed.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Error raised while synthesizing or emitting the final report.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A context entry the report needs is absent or malformed.
    #[error("report input unavailable: {0}")]
    Input(StageError),

    /// The synthesis call failed after retries.
    #[error("report synthesis failed: {0}")]
    Synthesis(#[from] StageExecutionError),

    /// The synthesized report did not match its schema.
    #[error("report rejected: {0}")]
    Schema(#[from] SchemaValidationError),

    /// The rendering sink failed.
    #[error("report sink failed: {0}")]
    Sink(#[from] SinkError),
}

/// Error raised by a report sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the artifact failed.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The target path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Error raised while loading the user input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input file could not be read.
    #[error("cannot read input file {path:?}: {source}")]
    Io {
        /// The input path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The input was not valid JSON for the expected shape.
    #[error("cannot parse input: {0}")]
    Parse(String),

    /// A required field was empty.
    #[error("input field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// The seed context could not be built.
    #[error("cannot seed context: {0}")]
    Seed(#[from] DuplicateKeyError),
}

/// Error raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path:?}: {source}")]
    Io {
        /// The config path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file was malformed.
    #[error("cannot parse config: {0}")]
    Parse(String),

    /// A required environment variable was not set.
    #[error("environment variable '{0}' is not set")]
    MissingEnv(String),

    /// A value failed validation.
    #[error("invalid config value for '{field}': {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// An HTTP client could not be constructed.
    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

/// Serializable summary of a failed run, for logs and CLI output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureSummary {
    /// The failing stage, if known.
    pub stage: Option<String>,
    /// Human-readable reason.
    pub reason: String,
    /// Whether the run was aborted.
    pub aborted: bool,
}

impl From<&PipelineError> for FailureSummary {
    fn from(err: &PipelineError) -> Self {
        Self {
            stage: err.stage().map(str::to_string),
            reason: err.to_string(),
            aborted: err.is_aborted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_field() {
        let err = SchemaValidationError::for_field(
            "StrategyEvaluationList",
            "evaluations[0].overall_score",
            "required field is missing",
            "{}",
        );

        assert!(err.to_string().contains("evaluations[0].overall_score"));
        assert_eq!(err.raw_snippet, "{}");
    }

    #[test]
    fn test_snippet_is_bounded() {
        let raw = "é".repeat(500);
        let s = snippet(&raw);
        assert!(s.chars().count() <= RAW_SNIPPET_LIMIT);
        assert!(s.ends_with("..."));

        let exact = "x".repeat(RAW_SNIPPET_LIMIT);
        assert_eq!(snippet(&exact), exact);
    }

    #[test]
    fn test_schema_error_display_without_field() {
        let err = SchemaValidationError::new("FinalReport", "no JSON object found", "plain text");
        assert_eq!(err.to_string(), "schema 'FinalReport' rejected output: no JSON object found");
    }

    #[test]
    fn test_provider_error_classification() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::from_status(429, "").is_transient());
        assert!(ProviderError::from_status(503, "busy").is_transient());
        assert!(!ProviderError::from_status(401, "").is_transient());
        assert!(!ProviderError::from_status(400, "bad").is_transient());
        assert!(!ProviderError::InvalidResponse("x".into()).is_transient());
    }

    #[test]
    fn test_pipeline_error_stage() {
        let err = PipelineError::Stage {
            stage: "market_documents".into(),
            source: StageError::Execution(StageExecutionError::new(
                "market_documents",
                3,
                ProviderError::Timeout,
            )),
        };

        assert_eq!(err.stage(), Some("market_documents"));
        assert!(err.to_string().contains("after 3 attempt(s)"));
        assert!(!err.is_aborted());
    }

    #[test]
    fn test_aborted_message() {
        let err = PipelineError::Aborted {
            stage: Some("analyst_output".into()),
            reason: "cancelled by user".into(),
        };
        assert_eq!(
            err.to_string(),
            "pipeline aborted during stage 'analyst_output': cancelled by user"
        );

        let summary = FailureSummary::from(&err);
        assert!(summary.aborted);
    }

    #[test]
    fn test_validation_error_to_dict() {
        let err = PipelineValidationError::new("PIPELINE-EMPTY", "Pipeline has no stages");
        let dict = err.to_dict();
        assert_eq!(dict.get("code").unwrap(), "PIPELINE-EMPTY");
        assert!(dict.get("stage").is_none());
    }
}
