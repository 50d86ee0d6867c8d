//! Tavily web-search client.

use super::{error_for_response, map_reqwest_error, SearchClient};
use crate::config::SearchConfig;
use crate::context::Document;
use crate::errors::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const USER_AGENT: &str = concat!("saleflow/", env!("CARGO_PKG_VERSION"));

/// Searches the web through the Tavily API.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: Client,
    url: String,
    api_key: String,
}

impl TavilyClient {
    /// Builds a client from search settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Client` if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, settings: &SearchConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/search", settings.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

impl From<SearchHit> for Document {
    fn from(hit: SearchHit) -> Self {
        Self {
            content: hit.content,
            title: hit.title,
            url: hit.url,
            score: hit.score,
        }
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, ProviderError> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let body: SearchResponse = response.json().await.map_err(|e| map_reqwest_error(&e))?;
        let documents: Vec<Document> = body
            .results
            .into_iter()
            .take(max_results)
            .map(Document::from)
            .collect();

        debug!(results = documents.len(), "Search completed");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let settings = SearchConfig {
            base_url: "https://search.test/".to_string(),
            ..SearchConfig::default()
        };
        let client = TavilyClient::new("k", &settings).unwrap();
        assert_eq!(client.url, "https://search.test/search");
    }

    #[test]
    fn test_hits_become_documents() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"query": "q", "results": [{"title": "HPI", "url": "https://x.test", "content": "Prices fell.", "score": 0.9}]}"#,
        )
        .unwrap();

        let docs: Vec<Document> = body.results.into_iter().map(Document::from).collect();
        assert_eq!(docs[0].content, "Prices fell.");
        assert_eq!(docs[0].url.as_deref(), Some("https://x.test"));
    }
}
