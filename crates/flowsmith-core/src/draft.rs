//! Draft tree: the lenient JSON wire format of a candidate pipeline
//!
//! Drafts carry no invariants. They are what a generator produces and what
//! the canonicalizer rewrites; [`crate::build`] turns a draft into the strict
//! [`crate::ast`] tree.

use crate::ast::Argument;
use crate::error::{Result, Rule, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDraft {
    #[serde(default)]
    pub imports: Vec<ImportDraft>,

    #[serde(default)]
    pub globals: Vec<GlobalDraft>,

    #[serde(default)]
    pub processes: Vec<ProcessDraft>,

    #[serde(default)]
    pub sub_workflows: Vec<WorkflowDraft>,

    pub main_workflow: WorkflowDraft,

    #[serde(default)]
    pub entrypoint: EntrypointDraft,
}

impl PipelineDraft {
    /// Parse a draft from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            ValidationError::new(Rule::MalformedDraft, format!("candidate is not a valid pipeline: {}", e))
        })
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            ValidationError::new(Rule::MalformedDraft, format!("candidate is not a valid pipeline: {}", e))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDraft {
    pub module_path: String,

    #[serde(default)]
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDraft {
    pub name: String,

    #[serde(deserialize_with = "lenient_text")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDraft {
    pub name: String,

    #[serde(default)]
    pub container: Option<String>,

    #[serde(default)]
    pub input_declarations: Vec<String>,

    #[serde(default)]
    pub output_declarations: Vec<String>,

    #[serde(default)]
    pub script_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDraft {
    pub name: String,

    #[serde(default)]
    pub take_channels: Vec<String>,

    #[serde(default)]
    pub body: Vec<StatementDraft>,

    #[serde(default)]
    pub emit_channels: Vec<EmitDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrypointDraft {
    #[serde(default)]
    pub body: Vec<StatementDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatementDraft {
    ProcessCall(CallDraft),
    ChannelChain(ChainDraft),
    Assignment(AssignmentDraft),
    Conditional(ConditionalDraft),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDraft {
    pub process_name: String,

    #[serde(default, deserialize_with = "lenient_args")]
    pub args: Vec<Argument>,

    #[serde(default)]
    pub assign_to: Option<String>,

    #[serde(default)]
    pub output_attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDraft {
    pub start_variable: String,

    #[serde(default)]
    pub steps: Vec<OperatorDraft>,

    #[serde(default)]
    pub set_variable: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDraft {
    pub operator: String,

    #[serde(default, deserialize_with = "lenient_text_list")]
    pub args: Vec<String>,

    #[serde(default, deserialize_with = "lenient_text_list")]
    pub closure_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub variable: String,

    #[serde(deserialize_with = "lenient_text")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalDraft {
    pub condition: String,

    #[serde(default)]
    pub body: Vec<StatementDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitDraft {
    pub export_name: String,

    #[serde(default)]
    pub internal_variable: Option<String>,
}

/// Arguments as generators tend to write them
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseArgument {
    Typed(Argument),
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<LooseArgument> for Argument {
    fn from(arg: LooseArgument) -> Self {
        match arg {
            LooseArgument::Typed(arg) => arg,
            LooseArgument::Text(text) => Argument::infer(&text),
            LooseArgument::Number(n) => Argument::NumericLiteral {
                value: crate::ast::NumericValue::Number(n),
            },
            LooseArgument::Bool(b) => Argument::NumericLiteral {
                value: crate::ast::NumericValue::Bool(b),
            },
        }
    }
}

fn lenient_args<'de, D>(deserializer: D) -> std::result::Result<Vec<Argument>, D::Error>
where
    D: Deserializer<'de>,
{
    let loose = Vec::<LooseArgument>::deserialize(deserializer)?;
    Ok(loose.into_iter().map(Argument::from).collect())
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(value_to_text)
}

fn lenient_text_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values.into_iter().map(value_to_text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NumericValue;
    use serde_json::json;

    #[test]
    fn test_minimal_draft() {
        let draft = PipelineDraft::from_value(json!({
            "main_workflow": {"name": "MAIN"}
        }))
        .unwrap();

        assert_eq!(draft.main_workflow.name, "MAIN");
        assert!(draft.imports.is_empty());
        assert!(draft.entrypoint.body.is_empty());
    }

    #[test]
    fn test_statement_discriminator() {
        let draft = PipelineDraft::from_value(json!({
            "main_workflow": {
                "name": "MAIN",
                "body": [
                    {"type": "process_call", "process_name": "FASTQC", "args": ["reads", "'fast'", 2, true]},
                    {"type": "channel_chain", "start_variable": "reads",
                     "steps": [{"operator": "buffer", "args": [{"size": 2}, 3]}]},
                    {"type": "assignment", "variable": "threads", "value": 4},
                    {"type": "conditional", "condition": "!params.skip", "body": []}
                ]
            }
        }))
        .unwrap();

        let body = &draft.main_workflow.body;
        assert_eq!(body.len(), 4);

        match &body[0] {
            StatementDraft::ProcessCall(call) => {
                assert_eq!(call.args[0], Argument::variable("reads"));
                assert_eq!(call.args[1], Argument::string("fast"));
                assert_eq!(
                    call.args[3],
                    Argument::NumericLiteral {
                        value: NumericValue::Bool(true)
                    }
                );
            }
            other => panic!("expected process call, got {:?}", other),
        }
        match &body[1] {
            StatementDraft::ChannelChain(chain) => {
                assert_eq!(chain.steps[0].args, vec!["{\"size\":2}", "3"]);
            }
            other => panic!("expected chain, got {:?}", other),
        }
        match &body[2] {
            StatementDraft::Assignment(assignment) => assert_eq!(assignment.value, "4"),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_draft_is_schema_violation() {
        let err = PipelineDraft::from_json("{\"imports\": []}").unwrap_err();
        assert_eq!(err.rule, Rule::MalformedDraft);
        assert_eq!(err.kind, crate::error::ErrorKind::SchemaViolation);

        let err = PipelineDraft::from_json("not json").unwrap_err();
        assert_eq!(err.rule, Rule::MalformedDraft);
    }
}
