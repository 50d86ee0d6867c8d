//! Azure OpenAI chat-completions client.

use super::{error_for_response, map_reqwest_error, CompletionClient};
use crate::config::CompletionConfig;
use crate::errors::{ConfigError, ProviderError};
use crate::providers::Completion;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

const USER_AGENT: &str = concat!("saleflow/", env!("CARGO_PKG_VERSION"));

/// Calls a single Azure OpenAI deployment.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    client: Client,
    url: String,
    api_key: String,
    deployment: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AzureOpenAiClient {
    /// Builds a client for the given endpoint and deployment settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Client` if the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        settings: &CompletionConfig,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: chat_url(endpoint, &settings.deployment, &settings.api_version),
            api_key: api_key.into(),
            deployment: settings.deployment.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    /// Returns a copy that samples at a different temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns a copy that targets a different API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        if let Some((base, _)) = self.url.split_once("?api-version=") {
            self.url = format!("{base}?api-version={api_version}");
        }
        self
    }
}

fn chat_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let request = ChatRequest {
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let body: ChatResponse = response.json().await.map_err(|e| map_reqwest_error(&e))?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::InvalidResponse("choice has no content".to_string()))?;

        let completion = Completion {
            content,
            model: body.model.unwrap_or_else(|| self.deployment.clone()),
            provider: "azure-openai".to_string(),
            input_tokens: body.usage.as_ref().map(|u| u.prompt_tokens),
            output_tokens: body.usage.as_ref().map(|u| u.completion_tokens),
            latency_ms: Some(started.elapsed().as_secs_f64() * 1000.0),
            finish_reason: choice.finish_reason,
        };
        debug!(
            model = %completion.model,
            total_tokens = completion.total_tokens(),
            latency_ms = completion.latency_ms,
            "Completion received"
        );
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url() {
        assert_eq!(
            chat_url("https://acme.openai.azure.com/", "gpt-4", "2024-12-01-preview"),
            "https://acme.openai.azure.com/openai/deployments/gpt-4/chat/completions?api-version=2024-12-01-preview"
        );
    }

    #[test]
    fn test_with_api_version() {
        let client = AzureOpenAiClient::new("https://acme.test", "k", &CompletionConfig::default())
            .unwrap()
            .with_api_version("2024-05-01-preview")
            .with_temperature(0.1);

        assert!(client.url.ends_with("?api-version=2024-05-01-preview"));
        assert!((client.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"model": "gpt-4", "choices": [{"message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}}"#,
        )
        .unwrap();

        assert_eq!(body.choices[0].message.content.as_deref(), Some("hi"));
        assert_eq!(body.usage.unwrap().completion_tokens, 2);
    }
}
