//! Compiler error types

use flowsmith_core::ValidationError;
use thiserror::Error;

/// Rendering error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Writing into the output buffer failed
    #[error("Formatting failed: {0}")]
    Format(#[from] std::fmt::Error),

    /// Statement nesting beyond the supported depth
    #[error("Statements nested {0} levels deep")]
    NestingTooDeep(usize),
}

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Construction or validation failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Program rendering failure
    #[error("Program rendering failed: {0}")]
    Render(#[from] RenderError),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
