//! Semantic analysis module
//!
//! Cross-node checks over a constructed pipeline tree.

pub mod scope;
pub mod validator;

pub use scope::Scope;
pub use validator::{EmitMode, SemanticValidator, ValidatedPipeline};
