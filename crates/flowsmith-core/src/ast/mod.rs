//! Strict pipeline AST
//!
//! Nodes in this module are obtained through fallible constructors that
//! enforce each node's local shape rules:
//! - Pipeline definitions (imports, globals, processes, workflows)
//! - Workflow statements (calls, channel chains, assignments, conditionals)
//! - Channel operators and their classes
//! - Identifier helpers

pub mod ident;
pub mod operator;
pub mod pipeline;
pub mod statement;

pub use operator::{Operator, OperatorClass, OperatorKind};
pub use pipeline::{
    EmitItem, EntrypointDef, GlobalDef, ImportSpec, ImportedSymbol, PipelineAst, ProcessDef,
    WorkflowDef,
};
pub use statement::{
    check_condition, Argument, Assignment, ChannelChain, Conditional, NumericValue, ProcessCall,
    Statement, MAX_NESTING_DEPTH,
};
