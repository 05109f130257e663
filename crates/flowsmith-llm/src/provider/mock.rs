//! Mock LLM provider for testing

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use crate::error::{LLMError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Mock LLM provider for testing
///
/// Replies are served from a script in order. Once the script is used up the
/// default response repeats. Every request is recorded.
pub struct MockProvider {
    name: String,
    default_response: String,
    script: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::with_response("{}".to_string())
    }

    /// Create with custom default response
    pub fn with_response(response: String) -> Self {
        Self {
            name: "mock".to_string(),
            default_response: response,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create with a sequence of replies served one per call
    pub fn with_script<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        let script = responses.into_iter().map(|r| Ok(r.into())).collect();
        Self {
            script: Mutex::new(script),
            ..provider
        }
    }

    /// Queue a failing call
    pub async fn push_error(&self, error: LLMError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Queue a reply
    pub async fn push_response(&self, response: impl Into<String>) {
        self.script.lock().await.push_back(Ok(response.into()));
    }

    /// Requests received so far
    pub async fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockProvider {
    async fn call(&self, request: LLMRequest) -> Result<LLMResponse> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);

        let next = self.script.lock().await.pop_front();
        let content = match next {
            Some(reply) => reply?,
            None => self.default_response.clone(),
        };

        Ok(LLMResponse::new(content, model)
            .with_tokens(10)
            .with_finish_reason("stop".to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
