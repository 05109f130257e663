//! Main compiler
//!
//! Runs the ordered stages over a candidate draft: canonicalize, construct,
//! validate, then render program text and diagram.

use crate::canonical::canonicalize;
use crate::codegen::{DiagramRenderer, ProgramRenderer};
use crate::error::{RenderError, Result};
use crate::semantic::{EmitMode, SemanticValidator, ValidatedPipeline};
use flowsmith_core::{PipelineDraft, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Compiler options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Treatment of emits whose source cannot be resolved
    #[serde(default)]
    pub emit_mode: EmitMode,
}

impl CompilerOptions {
    pub fn with_emit_mode(mut self, emit_mode: EmitMode) -> Self {
        self.emit_mode = emit_mode;
        self
    }
}

/// Rendered outputs of one validated pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPipeline {
    pub program_text: String,
    pub diagram_text: String,

    /// Set when the diagram degraded to a placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram_error: Option<String>,
}

/// The Flowsmith compiler
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
    validator: SemanticValidator,
}

impl Compiler {
    /// Create a new compiler instance with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create a new compiler instance with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        let validator = SemanticValidator::new(options.emit_mode);
        Self { options, validator }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Canonicalize, construct and validate a draft
    pub fn check(&self, draft: PipelineDraft) -> std::result::Result<ValidatedPipeline, ValidationError> {
        let draft = canonicalize(draft);
        let ast = flowsmith_core::build(draft)?;
        self.validator.validate(ast)
    }

    /// Parse a JSON candidate and check it
    pub fn check_json(&self, text: &str) -> std::result::Result<ValidatedPipeline, ValidationError> {
        self.check(PipelineDraft::from_json(text)?)
    }

    /// Check a candidate already parsed into a JSON value
    pub fn check_value(
        &self,
        value: serde_json::Value,
    ) -> std::result::Result<ValidatedPipeline, ValidationError> {
        self.check(PipelineDraft::from_value(value)?)
    }

    /// Render program text and diagram
    ///
    /// A program failure is returned as an error. A diagram failure is
    /// replaced by a placeholder flowchart naming the error.
    pub fn render(
        &self,
        pipeline: &ValidatedPipeline,
    ) -> std::result::Result<RenderedPipeline, RenderError> {
        let program_text = ProgramRenderer::render(pipeline)?;

        let (diagram_text, diagram_error) = match DiagramRenderer::render(pipeline) {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("diagram rendering failed: {}", e);
                (diagram_placeholder(&e), Some(e.to_string()))
            }
        };

        debug!(
            "rendered '{}': {} bytes of program text",
            pipeline.ast().main_workflow.name,
            program_text.len()
        );

        Ok(RenderedPipeline {
            program_text,
            diagram_text,
            diagram_error,
        })
    }

    /// Check and render in one step
    pub fn compile(&self, draft: PipelineDraft) -> Result<(ValidatedPipeline, RenderedPipeline)> {
        let pipeline = self.check(draft)?;
        let rendered = self.render(&pipeline)?;
        Ok((pipeline, rendered))
    }
}

/// Flowchart shown in place of a diagram that failed to render
pub fn diagram_placeholder(error: &RenderError) -> String {
    format!(
        "flowchart TD\n    diagram_error[\"Diagram unavailable: {}\"]\n",
        error.to_string().replace('"', "'")
    )
}
