//! Flowsmith HTTP Server
//!
//! Provides a REST API for generating validated pipelines.

use anyhow::Result;
use flowsmith_server::api::rest::{create_router_with_state, AppState};
use flowsmith_server::config::ServerConfig;
use flowsmith_server::engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    // Initialize pipeline service
    let service = engine::init_service(&config)?;
    info!("Pipeline service initialized");

    let mut state = AppState::new(Arc::new(service));
    if let Some(secs) = config.request_timeout_secs {
        state = state.with_request_timeout(Duration::from_secs(secs));
    }
    let app = create_router_with_state(state);

    // Start server
    let addr = config.addr();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Generate API: POST http://{}/v1/generate", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let default_filter = format!(
        "flowsmith_server={level},flowsmith_sdk={level},tower_http=debug",
        level = config.log_level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
