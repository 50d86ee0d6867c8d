//! Provider response types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A completion returned by a text-completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Reply text.
    pub content: String,
    /// Model that answered.
    pub model: String,
    /// Provider name.
    pub provider: String,
    /// Prompt tokens, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Completion tokens, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    /// Round-trip time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Why generation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl Completion {
    /// Creates a completion with content only, for doubles and fixtures.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: "scripted".to_string(),
            provider: "test".to_string(),
            input_tokens: None,
            output_tokens: None,
            latency_ms: None,
            finish_reason: None,
        }
    }

    /// Returns total tokens.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.unwrap_or(0) + self.output_tokens.unwrap_or(0)
    }

    /// Converts to log attributes.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("llm.model".to_string(), serde_json::json!(self.model));
        map.insert("llm.provider".to_string(), serde_json::json!(self.provider));
        if let Some(t) = self.input_tokens { map.insert("llm.input_tokens".to_string(), serde_json::json!(t)); }
        if let Some(t) = self.output_tokens { map.insert("llm.output_tokens".to_string(), serde_json::json!(t)); }
        map.insert("llm.total_tokens".to_string(), serde_json::json!(self.total_tokens()));
        if let Some(l) = self.latency_ms { map.insert("llm.latency_ms".to_string(), serde_json::json!(l)); }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_tokens() {
        let mut completion = Completion::text("hi");
        assert_eq!(completion.total_tokens(), 0);

        completion.input_tokens = Some(120);
        completion.output_tokens = Some(30);
        assert_eq!(completion.total_tokens(), 150);
        assert_eq!(completion.to_attributes()["llm.total_tokens"], 150);
    }
}
