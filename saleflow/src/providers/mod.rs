//! External collaborators: text completion and web search.
//!
//! Stages talk to providers only through [`CompletionClient`] and
//! [`SearchClient`], so tests can substitute scripted doubles and the HTTP
//! clients stay behind the `http` feature.

#[cfg(feature = "http")]
mod azure;
mod response;
#[cfg(feature = "http")]
mod tavily;

#[cfg(feature = "http")]
pub use azure::AzureOpenAiClient;
pub use response::Completion;
#[cfg(feature = "http")]
pub use tavily::TavilyClient;

use crate::context::Document;
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::fmt::Debug;

/// A text-completion service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync + Debug {
    /// Sends one prompt and returns the model's reply.
    async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError>;
}

/// A web-search service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchClient: Send + Sync + Debug {
    /// Runs one query and returns documents in relevance order.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, ProviderError>;
}

#[cfg(feature = "http")]
pub(crate) fn map_reqwest_error(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::InvalidResponse(err.to_string())
    } else if let Some(status) = err.status() {
        ProviderError::from_status(status.as_u16(), &err.to_string())
    } else {
        ProviderError::Transport(err.to_string())
    }
}

#[cfg(feature = "http")]
pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<std::time::Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(std::time::Duration::from_secs)
}

/// Turns a non-success response into a `ProviderError`.
#[cfg(feature = "http")]
pub(crate) async fn error_for_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let wait = retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    match ProviderError::from_status(status, &body) {
        ProviderError::RateLimited { .. } => ProviderError::RateLimited { retry_after: wait },
        other => other,
    }
}
