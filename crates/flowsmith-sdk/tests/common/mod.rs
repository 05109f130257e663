//! Common test utilities for SDK integration tests

use flowsmith_llm::{LlmAstGenerator, MockProvider};
use flowsmith_sdk::{PipelineService, PipelineServiceBuilder};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A candidate that validates
pub fn valid_candidate() -> String {
    json!({
        "imports": [{"module_path": "../steps/fastqc", "functions": ["step_fastqc"]}],
        "main_workflow": {
            "name": "QC_MAIN",
            "take_channels": ["reads"],
            "body": [{"type": "process_call", "process_name": "step_fastqc", "args": ["reads"], "assign_to": "report"}],
            "emit_channels": [{"export_name": "report"}]
        },
        "entrypoint": {"body": [
            {"type": "assignment", "variable": "reads", "value": "Channel.fromPath(params.reads)"},
            {"type": "process_call", "process_name": "QC_MAIN", "args": ["reads"]}
        ]}
    })
    .to_string()
}

/// A candidate referencing an undeclared variable
pub fn scope_failure() -> String {
    json!({
        "main_workflow": {
            "name": "MAIN",
            "body": [{"type": "assignment", "variable": "x", "value": "undeclared.out"}]
        }
    })
    .to_string()
}

/// A candidate with a chain in the entrypoint
pub fn architecture_failure() -> String {
    format!(
        "```json\n{}\n```",
        json!({
            "main_workflow": {"name": "MAIN", "take_channels": ["reads"]},
            "entrypoint": {"body": [{
                "type": "channel_chain",
                "start_variable": "Channel.fromPath(params.reads)",
                "steps": [{"operator": "collect"}],
                "set_variable": "reads"
            }]}
        })
    )
}

/// Service over a scripted mock provider
pub fn service_with_script(replies: Vec<String>) -> (PipelineService, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::with_script(replies));
    let generator = Arc::new(LlmAstGenerator::with_defaults(provider.clone()));
    let service = PipelineServiceBuilder::new()
        .with_generator(generator)
        .build()
        .unwrap();
    (service, provider)
}

/// Write a small catalog into `dir`
pub fn write_catalog(dir: &Path) {
    fs::write(
        dir.join("components.json"),
        json!({"components": [
            {
                "id": "tool_fastqc",
                "tool": "fastqc",
                "description": "Quality control report for raw sequencing reads",
                "container": "biocontainers/fastqc:0.12.1",
                "input_types": ["fastq"],
                "output_types": ["html", "zip"]
            },
            {
                "id": "tool_bwa",
                "tool": "bwa",
                "description": "Align short reads to a reference genome",
                "input_types": ["fastq", "fasta"],
                "output_types": ["bam"]
            }
        ]})
        .to_string(),
    )
    .unwrap();

    fs::write(
        dir.join("templates.json"),
        json!({"templates": [{
            "id": "module_read_qc",
            "description": "Quality control of raw reads",
            "logic_flow": [{"step": "tool_fastqc"}]
        }]})
        .to_string(),
    )
    .unwrap();

    fs::write(
        dir.join("code_store.jsonl"),
        [
            json!({"id": "tool_fastqc", "content": "process step_fastqc { script: 'fastqc' }"}).to_string(),
            "not json".to_string(),
            json!({"id": "module_read_qc", "content": "workflow { step_fastqc(reads) }"}).to_string(),
        ]
        .join("\n"),
    )
    .unwrap();
}
