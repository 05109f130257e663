//! LLM-backed pipeline tree generator

use crate::client::{ChatMessage, LLMClient, LLMRequest, LLMResponse};
use crate::error::Result;
use crate::generator::json_extractor::extract_json;
use crate::generator::{AstGenerator, Candidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Configuration for tree generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Model to use for generation
    pub model: String,
    /// Maximum tokens for response
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 1.0, lower = more deterministic)
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Request a JSON object response from the provider
    pub json_mode: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "mistral-large-latest".to_string(),
            max_tokens: Some(8192),
            temperature: Some(0.1),
            top_p: Some(0.9),
            json_mode: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with a specific model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Tree generator using an LLM client
pub struct LlmAstGenerator {
    client: Arc<dyn LLMClient>,
    config: GeneratorConfig,
}

impl LlmAstGenerator {
    /// Create a new generator
    pub fn new(client: Arc<dyn LLMClient>, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    /// Create with default configuration
    pub fn with_defaults(client: Arc<dyn LLMClient>) -> Self {
        Self::new(client, GeneratorConfig::default())
    }

    /// Get current configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn request(&self, history: &[ChatMessage]) -> LLMRequest {
        let mut request = LLMRequest::new(history.to_vec(), self.config.model.clone())
            .with_json_mode(self.config.json_mode);
        request.max_tokens = self.config.max_tokens;
        request.temperature = self.config.temperature;
        request.top_p = self.config.top_p;
        request
    }

    /// Generate and return the raw LLM response alongside the candidate
    #[instrument(
        name = "generate",
        skip_all,
        fields(backend = %self.client.name(), model = %self.config.model, turns = history.len())
    )]
    pub async fn generate_with_metadata(
        &self,
        history: &[ChatMessage],
    ) -> Result<(Candidate, LLMResponse)> {
        let response = self.client.call(self.request(history)).await?;
        debug!(
            "backend returned {} chars ({} tokens, finish: {})",
            response.content.len(),
            response.tokens_used,
            response.finish_reason
        );

        let candidate = match extract_json(&response.content) {
            Ok(value) => Candidate::Parsed(value),
            Err(e) => {
                warn!("generator output is not a pipeline object: {}", e);
                Candidate::Unparseable {
                    raw: response.content.clone(),
                    reason: e.to_string(),
                }
            }
        };
        Ok((candidate, response))
    }
}

#[async_trait]
impl AstGenerator for LlmAstGenerator {
    async fn generate(&self, history: &[ChatMessage]) -> Result<Candidate> {
        let (candidate, _) = self.generate_with_metadata(history).await?;
        Ok(candidate)
    }

    fn is_ready(&self) -> bool {
        self.client.is_configured()
    }

    fn backend(&self) -> &str {
        self.client.name()
    }
}
