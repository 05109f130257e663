//! Flowsmith SDK
//!
//! High-level API for generating validated pipelines: reference retrieval,
//! the bounded repair loop around a generator, and rendering.

pub mod builder;
pub mod config;
pub mod error;
pub mod repair;
pub mod retrieval;
pub mod service;

// Re-export main types
pub use builder::PipelineServiceBuilder;
pub use config::EngineConfig;
pub use error::{Result, SdkError};
pub use repair::{RepairLoop, RepairOutcome, RepairState};
pub use retrieval::{
    render_context, CatalogRetriever, Component, ContextEntry, EntryType, Helper,
    ReferenceCatalog, Retriever, Template,
};
pub use service::{
    GenerateRequest, GenerateResponse, GenerateStatus, HealthStatus, PipelineService,
};

// Re-export commonly used types from dependencies
pub use flowsmith_compiler::{CompilerOptions, EmitMode, ValidatedPipeline};
pub use flowsmith_core::{ErrorKind, ValidationError};
pub use tokio_util::sync::CancellationToken;
