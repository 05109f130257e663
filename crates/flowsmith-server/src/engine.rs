//! Pipeline service initialization
//!
//! Converts server configuration into the SDK service: picks the generator
//! backend and hands catalog and repair settings to the builder.

use crate::config::{LlmProviderKind, LlmSettings, ServerConfig};
use anyhow::Result;
use flowsmith_llm::{
    AstGenerator, GeneratorConfig, LLMClient, LlmAstGenerator, MockProvider, OpenAIProvider,
};
use flowsmith_sdk::{PipelineService, PipelineServiceBuilder};
use std::sync::Arc;
use tracing::{info, warn};

/// Initialize the pipeline service
pub fn init_service(config: &ServerConfig) -> Result<PipelineService> {
    let generator = init_generator(&config.llm);

    let service = PipelineServiceBuilder::new()
        .with_config(config.engine_config())
        .with_generator(generator)
        .build()?;

    Ok(service)
}

/// Build the generator from the LLM settings
///
/// A missing API key is not fatal: the service starts and reports itself as
/// degraded until restarted with a key.
pub fn init_generator(llm: &LlmSettings) -> Arc<dyn AstGenerator> {
    let client: Arc<dyn LLMClient> = match llm.provider {
        LlmProviderKind::Mock => {
            warn!("using the mock generator, every request will produce an empty tree");
            Arc::new(MockProvider::new())
        }
        kind => {
            let api_key = std::env::var(&llm.api_key_env).unwrap_or_default();
            if api_key.trim().is_empty() {
                warn!("{} is not set, generation requests will fail", llm.api_key_env);
            }
            let provider = match (&llm.base_url, kind) {
                (Some(url), _) => OpenAIProvider::with_base_url(api_key, url.clone()),
                (None, LlmProviderKind::OpenAI) => OpenAIProvider::new(api_key),
                (None, _) => OpenAIProvider::mistral(api_key),
            };
            info!(
                "generator backend '{}' at {} ({})",
                provider.name(),
                provider.base_url(),
                llm.model
            );
            Arc::new(provider)
        }
    };

    let generator_config = GeneratorConfig::new(llm.model.clone())
        .with_temperature(llm.temperature)
        .with_max_tokens(llm.max_tokens);

    Arc::new(LlmAstGenerator::new(client, generator_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_generator_is_ready() {
        let llm = LlmSettings {
            provider: LlmProviderKind::Mock,
            ..Default::default()
        };
        assert!(init_generator(&llm).is_ready());
    }

    #[test]
    fn test_missing_api_key_degrades() {
        let llm = LlmSettings {
            provider: LlmProviderKind::OpenAI,
            api_key_env: "FLOWSMITH_TEST_UNSET_API_KEY".to_string(),
            ..Default::default()
        };
        let generator = init_generator(&llm);
        assert!(!generator.is_ready());
        assert_eq!(generator.backend(), "openai");
    }

    #[test]
    fn test_default_backend_is_mistral() {
        let llm = LlmSettings {
            api_key_env: "FLOWSMITH_TEST_UNSET_API_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(init_generator(&llm).backend(), "mistral");
    }

    #[test]
    fn test_init_service_without_catalog() {
        let config = ServerConfig {
            llm: LlmSettings {
                provider: LlmProviderKind::Mock,
                ..Default::default()
            },
            max_retries: 2,
            ..Default::default()
        };

        let service = init_service(&config).unwrap();
        assert_eq!(service.config().max_retries, 2);
        assert!(!service.health().retriever_ready);
    }

    #[test]
    fn test_init_service_missing_catalog_fails() {
        let config = ServerConfig {
            catalog_dir: Some("/nonexistent/flowsmith/catalog".into()),
            llm: LlmSettings {
                provider: LlmProviderKind::Mock,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(init_service(&config).is_err());
    }
}
