//! Flowsmith Compiler - candidate drafts to validated, rendered pipelines
//!
//! This crate runs the ordered stages over a candidate pipeline:
//! - Canonicalization of the draft
//! - Semantic validation of the constructed tree
//! - Program text generation
//! - Mermaid diagram generation

pub mod canonical;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod semantic;

// Re-export main types
pub use canonical::canonicalize;
pub use compiler::{diagram_placeholder, Compiler, CompilerOptions, RenderedPipeline};
pub use error::{CompileError, RenderError, Result};

// Re-export codegen types
pub use codegen::{DiagramRenderer, NodeIdAllocator, ProgramRenderer};

// Re-export semantic types
pub use semantic::{EmitMode, Scope, SemanticValidator, ValidatedPipeline};
