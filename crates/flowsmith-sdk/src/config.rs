//! Configuration types for the pipeline service

use flowsmith_compiler::{CompilerOptions, EmitMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Corrective generations allowed after the first failed candidate
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Reference entries handed to the generator per request
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding `components.json`, `templates.json` and `code_store.jsonl`
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,

    /// Repair attempts before a request fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retrieved entries per request
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Include source code of retrieved components in the context
    #[serde(default)]
    pub embed_code: bool,

    /// Compiler options
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retrieval_limit() -> usize {
    DEFAULT_RETRIEVAL_LIMIT
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            catalog_dir: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
            embed_code: false,
            compiler_options: CompilerOptions::default(),
        }
    }

    /// Set the catalog directory
    pub fn with_catalog_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_dir = Some(path.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retrieval_limit(mut self, limit: usize) -> Self {
        self.retrieval_limit = limit;
        self
    }

    pub fn embed_code(mut self, enable: bool) -> Self {
        self.embed_code = enable;
        self
    }

    /// Set how unresolvable emits are handled
    pub fn with_emit_mode(mut self, emit_mode: EmitMode) -> Self {
        self.compiler_options.emit_mode = emit_mode;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
