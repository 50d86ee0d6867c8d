//! Run configuration.
//!
//! Loaded from an optional JSON file. Secrets never live in the file: it
//! only names the environment variables that hold them, and those are
//! resolved once into [`Credentials`] before clients are built.

use crate::errors::ConfigError;
use crate::pipeline::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleflowConfig {
    /// Completion service settings for the pipeline stages.
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Settings for the report synthesis call.
    #[serde(default)]
    pub report: ReportConfig,
    /// Search service settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Retry policy applied to every external call.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Strategy selection settings.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Overall deadline for the pipeline run, in seconds.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
    /// Where artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Azure OpenAI chat-completions settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Deployment (model) name.
    #[serde(default = "default_deployment")]
    pub deployment: String,
    /// The `api-version` query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,
    /// Completion token cap, if any.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_completion_timeout")]
    pub request_timeout_secs: u64,
    /// Name of the env var holding the endpoint URL.
    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: String,
    /// Name of the env var holding the API key.
    #[serde(default = "default_azure_key_env")]
    pub api_key_env: String,
}

fn default_deployment() -> String {
    "gpt-4".to_string()
}

fn default_api_version() -> String {
    "2024-12-01-preview".to_string()
}

fn default_completion_timeout() -> u64 {
    120
}

fn default_endpoint_env() -> String {
    "AZURE_ENDPOINT".to_string()
}

fn default_azure_key_env() -> String {
    "AZURE_API_KEY".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            deployment: default_deployment(),
            api_version: default_api_version(),
            temperature: 0.0,
            max_tokens: None,
            request_timeout_secs: default_completion_timeout(),
            endpoint_env: default_endpoint_env(),
            api_key_env: default_azure_key_env(),
        }
    }
}

impl CompletionConfig {
    /// Gets the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Report synthesis and memo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Sampling temperature for the report call.
    #[serde(default = "default_report_temperature")]
    pub temperature: f32,
    /// The `api-version` used for the report call.
    #[serde(default = "default_report_api_version")]
    pub api_version: String,
    /// Memo `TO:` line.
    #[serde(default = "default_recipient")]
    pub recipient: String,
    /// Memo `FROM:` line.
    #[serde(default = "default_sender")]
    pub sender: String,
    /// Memo `SUBJECT:` line.
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_report_temperature() -> f32 {
    0.1
}

fn default_report_api_version() -> String {
    "2024-05-01-preview".to_string()
}

fn default_recipient() -> String {
    "Interested Parties".to_string()
}

fn default_sender() -> String {
    "Simulation & Strategy Unit".to_string()
}

fn default_subject() -> String {
    "Strategic Review of Property Sale".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            temperature: default_report_temperature(),
            api_version: default_report_api_version(),
            recipient: default_recipient(),
            sender: default_sender(),
            subject: default_subject(),
        }
    }
}

/// Tavily search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Documents requested per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Search API base URL.
    #[serde(default = "default_search_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub request_timeout_secs: u64,
    /// Name of the env var holding the API key.
    #[serde(default = "default_tavily_key_env")]
    pub api_key_env: String,
}

fn default_max_results() -> usize {
    10
}

fn default_search_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_search_timeout() -> u64 {
    30
}

fn default_tavily_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            base_url: default_search_url(),
            request_timeout_secs: default_search_timeout(),
            api_key_env: default_tavily_key_env(),
        }
    }
}

impl SearchConfig {
    /// Gets the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Strategy selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// How many strategies are recommended.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for SaleflowConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            report: ReportConfig::default(),
            search: SearchConfig::default(),
            retry: RetryConfig::default(),
            selection: SelectionConfig::default(),
            run_timeout_secs: None,
            output_dir: default_output_dir(),
        }
    }
}

impl SaleflowConfig {
    /// Loads configuration from a JSON file, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed input.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.top_k == 0 {
            return Err(invalid("selection.top_k", "must be at least 1"));
        }
        if self.search.max_results == 0 {
            return Err(invalid("search.max_results", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(invalid("completion.temperature", "must be within [0, 2]"));
        }
        if !(0.0..=2.0).contains(&self.report.temperature) {
            return Err(invalid("report.temperature", "must be within [0, 2]"));
        }
        if self.completion.deployment.trim().is_empty() {
            return Err(invalid("completion.deployment", "must not be empty"));
        }
        if self.run_timeout_secs == Some(0) {
            return Err(invalid("run_timeout_secs", "must be positive"));
        }
        Ok(())
    }

    /// Gets the overall run deadline, if configured.
    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    /// Resolves credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` naming the first unset variable.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through a custom lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` naming the first unset or blank variable.
    pub fn credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, ConfigError> {
        let resolve = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        Ok(Credentials {
            azure_endpoint: resolve(&self.completion.endpoint_env)?,
            azure_api_key: resolve(&self.completion.api_key_env)?,
            tavily_api_key: resolve(&self.search.api_key_env)?,
        })
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.to_string(),
    }
}

/// Secrets resolved from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Azure OpenAI endpoint URL.
    pub azure_endpoint: String,
    /// Azure OpenAI API key.
    pub azure_api_key: String,
    /// Tavily API key.
    pub tavily_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("azure_endpoint", &self.azure_endpoint)
            .field("azure_api_key", &"<redacted>")
            .field("tavily_api_key", &"<redacted>")
            .finish()
    }
}
