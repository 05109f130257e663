//! Generator backend errors
//!
//! Only failures to obtain a reply live here. A reply that does not hold a
//! pipeline tree is an unparseable candidate, not an error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Debug, Error)]
pub enum LLMError {
    /// The backend was unreachable or answered with a non-success status
    #[error("backend request failed: {0}")]
    Transport(String),

    /// The backend lacks what it needs to make calls, such as an API key
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// The backend answered but the reply carries no usable text
    #[error("unusable backend reply: {0}")]
    BadReply(String),
}
