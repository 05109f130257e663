//! Flowsmith LLM Integration
//!
//! This crate provides the generator collaborator of the repair loop:
//! - Chat-style LLM clients (OpenAI-compatible endpoints, scripted mock)
//! - Prompt templates for the initial request and repair turns
//! - Extraction of the candidate JSON tree from model output
//!
//! Candidates are not checked here; validation happens in
//! `flowsmith-compiler`.

// Re-export core types
pub use client::{ChatMessage, ChatRole, LLMClient, LLMRequest, LLMResponse};
pub use error::{LLMError, Result};

// Re-export providers
pub use provider::{MockProvider, OpenAIProvider};

// Re-export generators
pub use generator::{
    extract_json, initial_messages, repair_message, AstGenerator, Candidate, GeneratorConfig,
    LlmAstGenerator, ARCHITECT_SYSTEM_PROMPT,
};

pub mod client;
pub mod error;
pub mod generator;
pub mod provider;
