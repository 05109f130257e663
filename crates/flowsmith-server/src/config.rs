//! Server configuration

use flowsmith_compiler::EmitMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the optional configuration file (any supported
/// extension)
pub const DEFAULT_CONFIG_FILE: &str = "config/server";

/// Environment variable prefix, e.g. `FLOWSMITH_PORT` or `FLOWSMITH_LLM__MODEL`
pub const ENV_PREFIX: &str = "FLOWSMITH";

/// Generator backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Mistral's hosted chat completions API
    #[default]
    Mistral,
    /// OpenAI or any compatible endpoint
    OpenAI,
    /// Offline mock returning an empty object
    Mock,
}

/// Generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,

    pub model: String,

    /// Override for the provider's base URL
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    pub temperature: f32,

    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Mistral,
            model: "mistral-large-latest".to_string(),
            base_url: None,
            api_key_env: "MISTRAL_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: 8192,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Reference catalog directory (optional, an empty catalog otherwise)
    pub catalog_dir: Option<PathBuf>,

    /// Repair attempts after the first generation
    pub max_retries: u32,

    /// Emit-block handling for sub-workflows
    pub emit_mode: EmitMode,

    /// Cancel a generation request after this many seconds (optional)
    pub request_timeout_secs: Option<u64>,

    pub llm: LlmSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            catalog_dir: None,
            max_retries: flowsmith_sdk::config::DEFAULT_MAX_RETRIES,
            emit_mode: EmitMode::default(),
            request_timeout_secs: None,
            llm: LlmSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file (which may be absent) plus
    /// the environment
    pub fn load_from(file: &str) -> anyhow::Result<Self> {
        let config_result = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(e) => {
                tracing::info!("No usable config source ({}), using default configuration", e);
                Ok(Self::default())
            }
        }
    }

    /// Socket address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// SDK-level configuration for the pipeline service
    pub fn engine_config(&self) -> flowsmith_sdk::EngineConfig {
        let mut engine = flowsmith_sdk::EngineConfig::new()
            .with_max_retries(self.max_retries)
            .with_emit_mode(self.emit_mode);
        if let Some(dir) = &self.catalog_dir {
            engine = engine.with_catalog_dir(dir.clone());
        }
        engine
    }
}
