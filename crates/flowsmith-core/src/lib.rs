//! Flowsmith Core - pipeline AST for generated DSL2 workflows
//!
//! This crate provides the tree shared by every Flowsmith stage:
//! - Draft tree (lenient JSON wire format of a candidate pipeline)
//! - Strict AST with fallible, rule-checking constructors
//! - Draft to AST construction
//! - Structured validation errors

pub mod ast;
pub mod build;
pub mod draft;
pub mod error;

// Re-export commonly used types
pub use ast::{
    Argument, ChannelChain, EmitItem, Operator, OperatorKind, PipelineAst, ProcessCall,
    Statement, WorkflowDef,
};
pub use build::build;
pub use draft::PipelineDraft;
pub use error::{ErrorKind, NodePath, Rule, ValidationError};
