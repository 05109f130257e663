//! REST API type definitions

use flowsmith_sdk::{GenerateRequest, PipelineService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PipelineService>,

    /// Generation requests still running after this long are cancelled
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(service: Arc<PipelineService>) -> Self {
        Self {
            service,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub generator: String,
    pub generator_ready: bool,
    pub retriever_ready: bool,
}

/// Generation request payload
///
/// Exactly one of `query` and `ast` must be present.
#[derive(Debug, Deserialize)]
pub struct GeneratePayload {
    /// Natural-language pipeline description
    #[serde(default)]
    pub query: Option<String>,

    /// Ready-made tree to check and render
    #[serde(default)]
    pub ast: Option<serde_json::Value>,
}

impl From<GeneratePayload> for GenerateRequest {
    fn from(payload: GeneratePayload) -> Self {
        GenerateRequest {
            query: payload.query,
            ast: payload.ast,
        }
    }
}
