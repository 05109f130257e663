//! Pipeline tree generation from chat context
//!
//! A generator turns a conversation history into a candidate pipeline
//! tree. Candidates are raw JSON; checking them is the caller's job.
//!
//! # Example
//! ```no_run
//! use flowsmith_llm::{initial_messages, AstGenerator, LlmAstGenerator, OpenAIProvider};
//! use std::sync::Arc;
//!
//! # async fn example() -> flowsmith_llm::Result<()> {
//! let provider = Arc::new(OpenAIProvider::mistral("your-api-key".to_string()));
//! let generator = LlmAstGenerator::with_defaults(provider);
//!
//! let history = initial_messages("Trim and align paired-end reads", "");
//! let candidate = generator.generate(&history).await?;
//! println!("{:?}", candidate);
//! # Ok(())
//! # }
//! ```

pub mod ast_generator;
pub mod json_extractor;
pub mod prompt_templates;

use crate::client::ChatMessage;
use crate::error::Result;
use async_trait::async_trait;

pub use ast_generator::{GeneratorConfig, LlmAstGenerator};
pub use json_extractor::extract_json;
pub use prompt_templates::{initial_messages, repair_message, ARCHITECT_SYSTEM_PROMPT};

/// One generation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// A JSON object was recovered from the output
    Parsed(serde_json::Value),

    /// The output held no usable JSON object
    Unparseable { raw: String, reason: String },
}

impl Candidate {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Candidate::Parsed(_))
    }
}

/// Produces candidate trees from a conversation history
///
/// An `Err` is a transport failure. Output that cannot be read as a tree
/// is a [`Candidate::Unparseable`], not an error.
#[async_trait]
pub trait AstGenerator: Send + Sync {
    async fn generate(&self, history: &[ChatMessage]) -> Result<Candidate>;

    /// Whether the generator can serve requests
    fn is_ready(&self) -> bool {
        true
    }

    /// Name of the backend serving generation requests
    fn backend(&self) -> &str {
        "custom"
    }
}
