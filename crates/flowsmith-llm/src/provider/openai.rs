//! OpenAI-compatible chat completions provider
//!
//! Works against any endpoint speaking the `/chat/completions` protocol,
//! including Mistral's hosted API.

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use crate::error::{LLMError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    api_key: String,
    base_url: String,
    name: &'static str,
    client: Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_BASE_URL.to_string())
    }

    /// Create with custom base URL (e.g., a self-hosted gateway)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            name: "openai",
            client: Client::new(),
        }
    }

    /// Create against Mistral's chat completions endpoint
    pub fn mistral(api_key: String) -> Self {
        Self {
            name: "mistral",
            ..Self::with_base_url(api_key, MISTRAL_BASE_URL.to_string())
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(request: &LLMRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": m.role.as_str(),
                    "content": m.content
                })
            })
            .collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = json!(top_p);
        }
        if request.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }
}

#[async_trait]
impl LLMClient for OpenAIProvider {
    async fn call(&self, request: LLMRequest) -> Result<LLMResponse> {
        if !self.is_configured() {
            return Err(LLMError::NotConfigured(format!(
                "{} API key is not set",
                self.name
            )));
        }

        let body = Self::request_body(&request);
        debug!(
            "calling {} model '{}' with {} messages",
            self.name,
            request.model,
            request.messages.len()
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                LLMError::Transport(format!("{} API call failed: {}", self.name, e))
            })?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(|e| {
            LLMError::Transport(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            return Err(LLMError::Transport(format!(
                "{} API error ({}): {}",
                self.name, status, resp_text
            )));
        }

        let resp_json: serde_json::Value = serde_json::from_str(&resp_text).map_err(|e| {
            LLMError::BadReply(format!("Failed to parse response: {}", e))
        })?;

        let content = resp_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LLMError::BadReply("No content in response".to_string()))?
            .to_string();

        let finish_reason = resp_json["choices"][0]["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let tokens_used = resp_json["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32;

        Ok(LLMResponse::new(content, request.model)
            .with_tokens(tokens_used)
            .with_finish_reason(finish_reason))
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAIProvider::new("test-key".to_string());
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.base_url(), OPENAI_BASE_URL);
        assert!(provider.is_configured());
    }

    #[test]
    fn test_mistral_provider() {
        let provider = OpenAIProvider::mistral("key".to_string());
        assert_eq!(provider.name(), "mistral");
        assert_eq!(provider.base_url(), MISTRAL_BASE_URL);
    }

    #[test]
    fn test_request_body() {
        let request = LLMRequest::new(
            vec![ChatMessage::system("rules"), ChatMessage::user("query")],
            "mistral-large-latest",
        )
        .with_temperature(0.1)
        .with_max_tokens(512)
        .with_json_mode(true);

        let body = OpenAIProvider::request_body(&request);
        assert_eq!(body["model"], "mistral-large-latest");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "query");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_custom_base_url_keeps_openai_name() {
        let provider =
            OpenAIProvider::with_base_url("key".to_string(), "http://gateway:8000/v1/".to_string());
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.base_url(), "http://gateway:8000/v1");
    }

    #[tokio::test]
    async fn test_missing_key_is_a_configuration_error() {
        let provider = OpenAIProvider::with_base_url(String::new(), "http://localhost:1".to_string());
        assert!(!provider.is_configured());

        let err = provider
            .call(LLMRequest::new(vec![ChatMessage::user("hi")], "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::NotConfigured(_)));
    }
}
