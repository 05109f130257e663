//! Code generation module
//!
//! Two independent renderers over the same validated tree: DSL2 program text
//! and a Mermaid flowchart.

pub mod diagram;
pub mod node_id;
pub mod program;

pub use diagram::DiagramRenderer;
pub use node_id::NodeIdAllocator;
pub use program::ProgramRenderer;
