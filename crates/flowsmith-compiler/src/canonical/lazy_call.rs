//! Lazy-call repair
//!
//! Rewrites `x = step_tool(a, 'b')[.attr]` assignments into process calls.

use flowsmith_core::ast::Argument;
use flowsmith_core::draft::{AssignmentDraft, CallDraft, PipelineDraft, StatementDraft};
use once_cell::sync::Lazy;
use regex::Regex;

static LAZY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)\s*\((.*)\)(\.[A-Za-z0-9_]+)?$").expect("valid regex")
});

const CALL_MARKERS: &[&str] = &["step_", "prepare_", "module_"];

/// Apply lazy-call repair to every body of the pipeline
pub fn repair_lazy_calls(draft: &mut PipelineDraft) {
    for workflow in draft.sub_workflows.iter_mut() {
        rewrite_body(&mut workflow.body);
    }
    rewrite_body(&mut draft.main_workflow.body);
    rewrite_body(&mut draft.entrypoint.body);
}

fn rewrite_body(body: &mut [StatementDraft]) {
    for statement in body.iter_mut() {
        let replacement = match statement {
            StatementDraft::Assignment(assignment) => as_process_call(assignment),
            StatementDraft::Conditional(conditional) => {
                rewrite_body(&mut conditional.body);
                None
            }
            _ => None,
        };
        if let Some(call) = replacement {
            tracing::debug!(
                "rewrote assignment '{}' into a call to '{}'",
                call.assign_to.as_deref().unwrap_or_default(),
                call.process_name
            );
            *statement = StatementDraft::ProcessCall(call);
        }
    }
}

fn has_call_marker(name: &str) -> bool {
    name.starts_with("get") || CALL_MARKERS.iter().any(|marker| name.contains(marker))
}

fn as_process_call(assignment: &AssignmentDraft) -> Option<CallDraft> {
    let captures = LAZY_CALL.captures(assignment.value.trim())?;
    let name = captures.get(1)?.as_str();
    if !has_call_marker(name) {
        return None;
    }

    let args = split_top_level(captures.get(2).map(|m| m.as_str()).unwrap_or_default())
        .into_iter()
        .map(|arg| Argument::infer(&arg))
        .collect();
    let output_attribute = captures
        .get(3)
        .map(|suffix| suffix.as_str().trim_start_matches('.').to_string());

    Some(CallDraft {
        process_name: name.to_string(),
        args,
        assign_to: Some(assignment.variable.clone()),
        output_attribute,
    })
}

/// Split on commas that are not nested in brackets or quotes
pub(crate) fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for c in text.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|part| !part.is_empty());
    parts
}
