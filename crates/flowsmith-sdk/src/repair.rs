//! Bounded repair loop
//!
//! ```text
//! Generating -> Validating -> Succeeded
//!                          -> Repairing -> Generating
//!                          -> Failed
//! ```
//!
//! Each failed candidate appends a corrective turn to the history; nothing
//! earlier is dropped. Generation is strictly sequential within a request.

use crate::error::Result;
use flowsmith_compiler::{Compiler, ValidatedPipeline};
use flowsmith_core::{Rule, ValidationError};
use flowsmith_llm::{repair_message, AstGenerator, Candidate, ChatMessage};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Repair loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairState {
    Generating,
    Validating,
    Repairing,
    Succeeded,
    Failed,
    Cancelled,
}

impl RepairState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RepairState::Succeeded | RepairState::Failed | RepairState::Cancelled
        )
    }
}

/// Terminal result of one loop run
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub state: RepairState,

    /// Corrective turns issued
    pub retries: u32,

    /// Set when the loop succeeded
    pub pipeline: Option<ValidatedPipeline>,

    /// Last validation failure, set when the loop failed
    pub error: Option<ValidationError>,

    /// Conversation as it stood when the loop stopped
    pub history: Vec<ChatMessage>,
}

/// Drives a generator until a candidate validates or retries run out
pub struct RepairLoop<'a> {
    generator: &'a dyn AstGenerator,
    compiler: &'a Compiler,
    max_retries: u32,
}

impl<'a> RepairLoop<'a> {
    pub fn new(generator: &'a dyn AstGenerator, compiler: &'a Compiler, max_retries: u32) -> Self {
        Self {
            generator,
            compiler,
            max_retries,
        }
    }

    /// Run from an initial history
    ///
    /// A generator transport failure ends the run with an error. Cancellation
    /// is observed before and during each generation call.
    pub async fn run(
        &self,
        mut history: Vec<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<RepairOutcome> {
        let mut state = RepairState::Generating;
        let mut retries = 0u32;
        let mut candidate: Option<Candidate> = None;
        let mut pipeline: Option<ValidatedPipeline> = None;
        let mut last_error: Option<ValidationError> = None;

        while !state.is_terminal() {
            let next = match state {
                RepairState::Generating => {
                    let generated = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.generator.generate(&history) => Some(result),
                    };
                    match generated {
                        None => RepairState::Cancelled,
                        Some(result) => {
                            candidate = Some(result?);
                            RepairState::Validating
                        }
                    }
                }
                RepairState::Validating => {
                    let checked = match candidate.take() {
                        Some(candidate) => self.check(candidate),
                        None => Err(ValidationError::new(
                            Rule::MalformedDraft,
                            "no candidate was produced",
                        )),
                    };
                    match checked {
                        Ok(validated) => {
                            pipeline = Some(validated);
                            last_error = None;
                            RepairState::Succeeded
                        }
                        Err(err) => {
                            warn!("candidate rejected (retry {}): {}", retries, err);
                            last_error = Some(err);
                            if retries < self.max_retries {
                                RepairState::Repairing
                            } else {
                                RepairState::Failed
                            }
                        }
                    }
                }
                RepairState::Repairing => {
                    if let Some(err) = &last_error {
                        history.push(repair_message(&err.feedback()));
                    }
                    retries += 1;
                    RepairState::Generating
                }
                terminal => terminal,
            };
            debug!("repair loop: {:?} -> {:?}", state, next);
            state = next;
        }

        if state == RepairState::Cancelled {
            info!("request cancelled after {} retries", retries);
            retries = 0;
            last_error = None;
        } else {
            info!("repair loop finished: {:?} after {} retries", state, retries);
        }

        Ok(RepairOutcome {
            state,
            retries,
            pipeline,
            error: last_error,
            history,
        })
    }

    fn check(&self, candidate: Candidate) -> std::result::Result<ValidatedPipeline, ValidationError> {
        match candidate {
            Candidate::Parsed(value) => self.compiler.check_value(value),
            Candidate::Unparseable { reason, .. } => Err(ValidationError::new(
                Rule::MalformedDraft,
                format!("output is not a pipeline JSON object: {}", reason),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowsmith_llm::LLMError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<flowsmith_llm::Result<Candidate>>>,
    }

    impl Scripted {
        fn new(replies: Vec<flowsmith_llm::Result<Candidate>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait]
    impl AstGenerator for Scripted {
        async fn generate(&self, _history: &[ChatMessage]) -> flowsmith_llm::Result<Candidate> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LLMError::Transport("script exhausted".to_string())))
        }
    }

    fn valid() -> Candidate {
        Candidate::Parsed(json!({"main_workflow": {"name": "MAIN"}}))
    }

    fn invalid() -> Candidate {
        Candidate::Parsed(json!({
            "main_workflow": {"name": "MAIN", "body": [
                {"type": "process_call", "process_name": "missing"}
            ]}
        }))
    }

    #[tokio::test]
    async fn test_first_candidate_succeeds() {
        let generator = Scripted::new(vec![Ok(valid())]);
        let compiler = Compiler::new();
        let outcome = RepairLoop::new(&generator, &compiler, 3)
            .run(vec![ChatMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, RepairState::Succeeded);
        assert_eq!(outcome.retries, 0);
        assert!(outcome.pipeline.is_some());
        assert_eq!(outcome.history.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_counts_as_schema_failure() {
        let generator = Scripted::new(vec![
            Ok(Candidate::Unparseable {
                raw: "sorry".to_string(),
                reason: "not json".to_string(),
            }),
            Ok(valid()),
        ]);
        let compiler = Compiler::new();
        let outcome = RepairLoop::new(&generator, &compiler, 3)
            .run(vec![ChatMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, RepairState::Succeeded);
        assert_eq!(outcome.retries, 1);
        assert!(outcome.history[1].content.contains("schema.malformed-draft"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_with_last_error() {
        let generator = Scripted::new(vec![Ok(invalid()), Ok(invalid()), Ok(invalid()), Ok(invalid())]);
        let compiler = Compiler::new();
        let outcome = RepairLoop::new(&generator, &compiler, 3)
            .run(vec![ChatMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, RepairState::Failed);
        assert_eq!(outcome.retries, 3);
        assert_eq!(outcome.history.len(), 4);
        assert_eq!(outcome.error.unwrap().kind, flowsmith_core::ErrorKind::ScopeError);
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let generator = Scripted::new(vec![Err(LLMError::Transport("down".to_string()))]);
        let compiler = Compiler::new();
        let result = RepairLoop::new(&generator, &compiler, 3)
            .run(vec![ChatMessage::user("q")], &CancellationToken::new())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_before_generation() {
        let generator = Scripted::new(vec![Ok(valid())]);
        let compiler = Compiler::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = RepairLoop::new(&generator, &compiler, 3)
            .run(vec![ChatMessage::user("q")], &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.state, RepairState::Cancelled);
        assert_eq!(outcome.retries, 0);
        assert!(outcome.pipeline.is_none());
        assert_eq!(generator.replies.lock().unwrap().len(), 1);
    }
}
