//! Pipeline generation service
//!
//! One request runs retrieval, the repair loop and both renderers. The
//! service holds no per-request state and is shared across requests.

use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use crate::repair::{RepairLoop, RepairState};
use crate::retrieval::{render_context, Retriever};
use flowsmith_compiler::{Compiler, ValidatedPipeline};
use flowsmith_core::ValidationError;
use flowsmith_llm::{initial_messages, AstGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Generation request: a natural-language query or a ready-made tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub query: Option<String>,

    /// Candidate tree to check and render without generation
    #[serde(default)]
    pub ast: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ast: None,
        }
    }

    pub fn ast(ast: serde_json::Value) -> Self {
        Self {
            query: None,
            ast: Some(ast),
        }
    }
}

/// Final request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// Generation response
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub status: GenerateStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<ValidatedPipeline>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram_text: Option<String>,

    /// Set when the diagram degraded to a placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram_error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,

    pub retries: u32,
}

impl GenerateResponse {
    fn failed(error: Option<ValidationError>, retries: u32) -> Self {
        Self {
            status: GenerateStatus::Failed,
            ast: None,
            program_text: None,
            diagram_text: None,
            diagram_error: None,
            error,
            retries,
        }
    }

    fn cancelled() -> Self {
        Self {
            status: GenerateStatus::Cancelled,
            ..Self::failed(None, 0)
        }
    }
}

/// Service readiness
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    /// Backend name reported by the generator
    pub generator: String,
    pub generator_ready: bool,
    pub retriever_ready: bool,
}

/// Pipeline generation service
pub struct PipelineService {
    generator: Arc<dyn AstGenerator>,
    retriever: Arc<dyn Retriever>,
    compiler: Compiler,
    config: EngineConfig,
}

impl PipelineService {
    pub fn new(
        generator: Arc<dyn AstGenerator>,
        retriever: Arc<dyn Retriever>,
        config: EngineConfig,
    ) -> Self {
        let compiler = Compiler::with_options(config.compiler_options.clone());
        Self {
            generator,
            retriever,
            compiler,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Serve one request
    ///
    /// Validation failures are reported in the response. Generator transport
    /// failures, program rendering failures and malformed requests are errors.
    pub async fn generate(
        &self,
        request: GenerateRequest,
        cancel: CancellationToken,
    ) -> Result<GenerateResponse> {
        match (request.query, request.ast) {
            (None, Some(ast)) => self.check_and_render(ast),
            (Some(query), None) if !query.trim().is_empty() => {
                self.generate_from_query(&query, &cancel).await
            }
            (Some(_), Some(_)) => Err(SdkError::InvalidRequest(
                "provide either 'query' or 'ast', not both".to_string(),
            )),
            _ => Err(SdkError::InvalidRequest(
                "a non-empty 'query' or an 'ast' is required".to_string(),
            )),
        }
    }

    fn check_and_render(&self, ast: serde_json::Value) -> Result<GenerateResponse> {
        match self.compiler.check_value(ast) {
            Ok(pipeline) => self.succeeded(pipeline, 0),
            Err(err) => {
                info!("supplied tree rejected: {}", err);
                Ok(GenerateResponse::failed(Some(err), 0))
            }
        }
    }

    async fn generate_from_query(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<GenerateResponse> {
        let retrieved = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(GenerateResponse::cancelled()),
            result = self.retriever.retrieve(query, self.config.retrieval_limit) => result,
        };
        let context = match retrieved {
            Ok(entries) => render_context(&entries),
            Err(e) => {
                warn!("retrieval failed, generating without reference context: {}", e);
                String::new()
            }
        };

        let history = initial_messages(query, &context);
        let outcome = RepairLoop::new(self.generator.as_ref(), &self.compiler, self.config.max_retries)
            .run(history, cancel)
            .await?;

        match (outcome.state, outcome.pipeline) {
            (RepairState::Succeeded, Some(pipeline)) => self.succeeded(pipeline, outcome.retries),
            (RepairState::Cancelled, _) => Ok(GenerateResponse::cancelled()),
            _ => Ok(GenerateResponse::failed(outcome.error, outcome.retries)),
        }
    }

    fn succeeded(&self, pipeline: ValidatedPipeline, retries: u32) -> Result<GenerateResponse> {
        let rendered = self.compiler.render(&pipeline)?;

        Ok(GenerateResponse {
            status: GenerateStatus::Succeeded,
            ast: Some(pipeline),
            program_text: Some(rendered.program_text),
            diagram_text: Some(rendered.diagram_text),
            diagram_error: rendered.diagram_error,
            error: None,
            retries,
        })
    }

    /// Readiness of the collaborators
    pub fn health(&self) -> HealthStatus {
        let generator_ready = self.generator.is_ready();
        let retriever_ready = self.retriever.is_ready();
        HealthStatus {
            status: if generator_ready { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generator: self.generator.backend().to_string(),
            generator_ready,
            retriever_ready,
        }
    }
}
