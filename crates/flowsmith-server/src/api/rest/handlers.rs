//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{extract::State, Json};
use flowsmith_sdk::{CancellationToken, GenerateResponse, GenerateStatus};
use tracing::{info, warn};

/// Health check endpoint
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.service.health();
    Json(HealthResponse {
        status: health.status,
        version: health.version,
        generator: health.generator,
        generator_ready: health.generator_ready,
        retriever_ready: health.retriever_ready,
    })
}

/// Generation endpoint
///
/// Validation failures come back as a `failed` body with the final error.
/// Dropping the request (client disconnect) or exceeding the configured
/// timeout cancels the repair loop.
#[axum::debug_handler]
pub(super) async fn generate(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<GeneratePayload>,
) -> Result<Json<GenerateResponse>, ServerError> {
    info!(
        "Received generate request (query: {}, ast: {})",
        payload.query.is_some(),
        payload.ast.is_some()
    );

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    if let Some(timeout) = state.request_timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    warn!("generate request exceeded {:?}, cancelling", timeout);
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });
    }

    let response = state.service.generate(payload.into(), cancel.clone()).await?;

    match response.status {
        GenerateStatus::Succeeded => info!("pipeline generated after {} retries", response.retries),
        GenerateStatus::Failed => info!(
            "pipeline rejected after {} retries: {}",
            response.retries,
            response
                .error
                .as_ref()
                .map(|e| e.rule.id())
                .unwrap_or("unknown")
        ),
        GenerateStatus::Cancelled => info!("generate request cancelled"),
    }

    Ok(Json(response))
}
