//! Builder for PipelineService

use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use crate::retrieval::{CatalogRetriever, ReferenceCatalog, Retriever};
use crate::service::PipelineService;
use flowsmith_compiler::EmitMode;
use flowsmith_llm::AstGenerator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Builder for PipelineService
///
/// # Example
///
/// ```rust,ignore
/// use flowsmith_sdk::PipelineServiceBuilder;
///
/// let service = PipelineServiceBuilder::new()
///     .with_generator(generator)
///     .with_catalog_dir("data/catalog")
///     .build()?;
/// ```
pub struct PipelineServiceBuilder {
    config: EngineConfig,
    generator: Option<Arc<dyn AstGenerator>>,
    retriever: Option<Arc<dyn Retriever>>,
}

impl PipelineServiceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            generator: None,
            retriever: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the generator collaborator (required)
    pub fn with_generator(mut self, generator: Arc<dyn AstGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the retrieval collaborator
    ///
    /// Takes precedence over a configured catalog directory.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Load the reference catalog from a directory at build time
    pub fn with_catalog_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.catalog_dir = Some(path.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn with_emit_mode(mut self, emit_mode: EmitMode) -> Self {
        self.config.compiler_options.emit_mode = emit_mode;
        self
    }

    /// Build the service
    ///
    /// Without a retriever or catalog directory, requests run with an empty
    /// reference catalog.
    pub fn build(self) -> Result<PipelineService> {
        let generator = self
            .generator
            .ok_or_else(|| SdkError::ConfigError("a generator is required".to_string()))?;

        let retriever = match self.retriever {
            Some(retriever) => retriever,
            None => {
                let catalog = match &self.config.catalog_dir {
                    Some(dir) => ReferenceCatalog::load(dir)?,
                    None => {
                        info!("no catalog directory configured, using an empty catalog");
                        ReferenceCatalog::new()
                    }
                };
                Arc::new(CatalogRetriever::new(Arc::new(catalog)).embed_code(self.config.embed_code))
            }
        };

        Ok(PipelineService::new(generator, retriever, self.config))
    }
}

impl Default for PipelineServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsmith_llm::{LlmAstGenerator, MockProvider};

    fn generator() -> Arc<dyn AstGenerator> {
        Arc::new(LlmAstGenerator::with_defaults(Arc::new(MockProvider::new())))
    }

    #[test]
    fn test_generator_is_required() {
        let result = PipelineServiceBuilder::new().build();
        assert!(matches!(result, Err(SdkError::ConfigError(_))));
    }

    #[test]
    fn test_builder_with_options() {
        let service = PipelineServiceBuilder::new()
            .with_generator(generator())
            .with_max_retries(1)
            .with_emit_mode(EmitMode::Strict)
            .build()
            .unwrap();

        assert_eq!(service.config().max_retries, 1);
        assert_eq!(service.compiler().options().emit_mode, EmitMode::Strict);

        let health = service.health();
        assert_eq!(health.generator, "mock");
        assert!(health.generator_ready);
        assert!(!health.retriever_ready);
    }

    #[test]
    fn test_missing_catalog_dir_is_an_error() {
        let result = PipelineServiceBuilder::new()
            .with_generator(generator())
            .with_catalog_dir("/nonexistent/flowsmith/catalog")
            .build();
        assert!(matches!(result, Err(SdkError::CatalogError(_))));
    }
}
