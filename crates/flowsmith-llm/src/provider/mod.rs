//! Chat backends
//!
//! Each backend reports a short lowercase name through
//! [`LLMClient::name`](crate::client::LLMClient::name); it appears in the
//! service health report and on every generation span.

mod mock;
mod openai;

pub use mock::MockProvider;
pub use openai::OpenAIProvider;
