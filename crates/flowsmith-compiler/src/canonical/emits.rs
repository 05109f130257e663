//! Emit fix-ups: implicit shorthand and auto-emit promotion

use flowsmith_core::draft::{EmitDraft, PipelineDraft, StatementDraft, WorkflowDraft};

fn workflows_mut(draft: &mut PipelineDraft) -> impl Iterator<Item = &mut WorkflowDraft> {
    draft
        .sub_workflows
        .iter_mut()
        .chain(std::iter::once(&mut draft.main_workflow))
}

/// `{export_name: "step_A.out"}` becomes `{export_name: "out", internal_variable: "step_A.out"}`
pub fn fix_implicit_shorthand(draft: &mut PipelineDraft) {
    for workflow in workflows_mut(draft) {
        for emit in workflow.emit_channels.iter_mut() {
            let has_source = emit
                .internal_variable
                .as_deref()
                .map(|source| !source.trim().is_empty())
                .unwrap_or(false);
            if has_source || !emit.export_name.contains('.') {
                continue;
            }

            let source = emit.export_name.trim().to_string();
            let export = source.rsplit('.').next().unwrap_or_default().to_string();
            emit.export_name = export;
            emit.internal_variable = Some(source);
        }
    }
}

/// Turn unbound output accessors into workflow emits
pub fn promote_output_accessors(draft: &mut PipelineDraft) {
    for workflow in workflows_mut(draft) {
        let WorkflowDraft {
            body,
            emit_channels,
            ..
        } = workflow;
        promote_in_body(body, emit_channels);
    }
}

fn promote_in_body(body: &mut [StatementDraft], emits: &mut Vec<EmitDraft>) {
    for statement in body.iter_mut() {
        match statement {
            StatementDraft::ProcessCall(call) if call.assign_to.is_none() => {
                let Some(attribute) = call.output_attribute.take() else {
                    continue;
                };

                let (export, source) = if attribute == "*" {
                    ("out".to_string(), format!("{}.out", call.process_name))
                } else {
                    (
                        attribute.clone(),
                        format!("{}.out.{}", call.process_name, attribute),
                    )
                };

                if !emits.iter().any(|emit| emit.export_name == export) {
                    tracing::debug!("promoted accessor '{}' to emit '{}'", source, export);
                    emits.push(EmitDraft {
                        export_name: export,
                        internal_variable: Some(source),
                    });
                }
            }
            StatementDraft::Conditional(conditional) => {
                promote_in_body(&mut conditional.body, emits);
            }
            _ => {}
        }
    }
}
