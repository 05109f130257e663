//! Main-workflow deduplication
//!
//! When sub-workflows exist and the main workflow declares inputs, channel
//! logic is expected to live in the sub-workflows. The main body keeps only
//! calls, with their arguments rebound to the declared inputs.

use flowsmith_core::ast::{Argument, NumericValue};
use flowsmith_core::draft::{PipelineDraft, StatementDraft};
use std::collections::HashSet;

/// Deduplicate the main workflow body against the sub-workflows
pub fn deduplicate_main(draft: &mut PipelineDraft) {
    if draft.sub_workflows.is_empty() || draft.main_workflow.take_channels.is_empty() {
        return;
    }

    let inputs = draft.main_workflow.take_channels.clone();
    let sub_workflows: HashSet<String> =
        draft.sub_workflows.iter().map(|wf| wf.name.clone()).collect();

    let body = std::mem::take(&mut draft.main_workflow.body);
    draft.main_workflow.body = clean_block(body, &inputs, &sub_workflows);
}

fn clean_block(
    statements: Vec<StatementDraft>,
    inputs: &[String],
    sub_workflows: &HashSet<String>,
) -> Vec<StatementDraft> {
    statements
        .into_iter()
        .filter_map(|statement| match statement {
            StatementDraft::Conditional(mut conditional) => {
                conditional.body = clean_block(conditional.body, inputs, sub_workflows);
                if conditional.body.is_empty() {
                    None
                } else {
                    Some(StatementDraft::Conditional(conditional))
                }
            }
            StatementDraft::ChannelChain(chain) => {
                tracing::debug!("dropped chain on '{}' from main workflow", chain.start_variable);
                None
            }
            StatementDraft::ProcessCall(call) if sub_workflows.contains(&call.process_name) => {
                tracing::debug!("dropped duplicate call to sub-workflow '{}'", call.process_name);
                None
            }
            StatementDraft::ProcessCall(mut call) => {
                call.args = rebind_args(call.args, inputs);
                Some(StatementDraft::ProcessCall(call))
            }
            other => Some(other),
        })
        .collect()
}

fn argument_text(arg: &Argument) -> String {
    match arg {
        Argument::Variable { name } => name.clone(),
        Argument::StringLiteral { value } => value.clone(),
        Argument::NumericLiteral { value } => match value {
            NumericValue::Bool(b) => b.to_string(),
            NumericValue::Number(n) => n.to_string(),
        },
    }
}

fn rebind_args(args: Vec<Argument>, inputs: &[String]) -> Vec<Argument> {
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let text = argument_text(&arg);
            let root = text.split('.').next().unwrap_or_default();
            if inputs.iter().any(|input| input == root) {
                return arg;
            }

            let matched = inputs
                .iter()
                .find(|input| text.contains(input.as_str()))
                .or_else(|| inputs.get(i));

            match matched {
                Some(input) => Argument::variable(input.clone()),
                None => arg,
            }
        })
        .collect()
}
