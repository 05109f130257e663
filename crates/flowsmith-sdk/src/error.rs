//! SDK error types

use flowsmith_compiler::RenderError;
use flowsmith_core::ValidationError;
use flowsmith_llm::LLMError;
use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reference catalog could not be loaded
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// The generator could not be reached
    #[error("Generator error: {0}")]
    GeneratorError(#[from] LLMError),

    /// A supplied tree failed validation
    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    /// Program rendering failed
    #[error("Render error: {0}")]
    RenderError(#[from] RenderError),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic SDK error
    #[error("SDK error: {0}")]
    GenericError(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use flowsmith_core::Rule;

    #[test]
    fn test_config_error() {
        let error = SdkError::ConfigError("Invalid configuration".to_string());
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_generator_error_conversion() {
        let error: SdkError = LLMError::Transport("timeout".to_string()).into();
        assert!(error.to_string().contains("Generator error"));
        assert!(error.to_string().contains("timeout"));
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let inner = ValidationError::new(Rule::EmptyChain, "chain on 'reads' has no operators");
        let expected = inner.to_string();
        let error: SdkError = inner.into();
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let sdk_error: SdkError = io_error.into();
        assert!(sdk_error.to_string().contains("I/O error"));
        assert!(sdk_error.to_string().contains("File not found"));
    }
}
