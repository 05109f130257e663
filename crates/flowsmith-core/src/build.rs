//! Construction of the strict tree from a draft
//!
//! Every node goes through its fallible constructor; the first failure is
//! returned with the path of the offending node.

use crate::ast::{
    Assignment, ChannelChain, Conditional, EmitItem, EntrypointDef, GlobalDef, ImportSpec,
    ImportedSymbol, Operator, PipelineAst, ProcessCall, ProcessDef, Statement, WorkflowDef,
    MAX_NESTING_DEPTH,
};
use crate::draft::{PipelineDraft, StatementDraft, WorkflowDraft};
use crate::error::{NodePath, Result, Rule, ValidationError};

/// Build a strict pipeline tree from a (canonicalized) draft
pub fn build(draft: PipelineDraft) -> Result<PipelineAst> {
    let PipelineDraft {
        imports,
        globals,
        processes,
        sub_workflows,
        main_workflow,
        entrypoint,
    } = draft;

    let imports = imports
        .into_iter()
        .enumerate()
        .map(|(i, import)| {
            let path = NodePath::scope(format!("imports[{}]", i));
            let functions = import
                .functions
                .iter()
                .map(|symbol| ImportedSymbol::parse(symbol))
                .collect::<Result<Vec<_>>>()
                .map_err(|e| e.at(path.clone()))?;
            ImportSpec::new(import.module_path, functions).map_err(|e| e.at(path))
        })
        .collect::<Result<Vec<_>>>()?;

    let globals = globals
        .into_iter()
        .map(|global| {
            let path = NodePath::scope(format!("global '{}'", global.name));
            GlobalDef::new(global.name, global.value).map_err(|e| e.at(path))
        })
        .collect::<Result<Vec<_>>>()?;

    let processes = processes
        .into_iter()
        .map(|process| {
            let path = NodePath::scope(format!("process '{}'", process.name));
            ProcessDef::new(
                process.name,
                process.container,
                process.input_declarations,
                process.output_declarations,
                process.script_block,
            )
            .map_err(|e| e.at(path))
        })
        .collect::<Result<Vec<_>>>()?;

    let sub_workflows = sub_workflows
        .into_iter()
        .map(build_workflow)
        .collect::<Result<Vec<_>>>()?;

    let main_workflow = build_workflow(main_workflow)?;

    let entry_path = NodePath::scope("entrypoint");
    let entrypoint = EntrypointDef {
        body: build_body(entrypoint.body, &entry_path, 0)?,
    };

    Ok(PipelineAst {
        imports,
        globals,
        processes,
        sub_workflows,
        main_workflow,
        entrypoint,
    })
}

impl TryFrom<PipelineDraft> for PipelineAst {
    type Error = ValidationError;

    fn try_from(draft: PipelineDraft) -> Result<Self> {
        build(draft)
    }
}

fn build_workflow(draft: WorkflowDraft) -> Result<WorkflowDef> {
    let path = NodePath::scope(format!("workflow '{}'", draft.name));

    let body = build_body(draft.body, &path, 0)?;
    let emits = draft
        .emit_channels
        .into_iter()
        .map(|emit| EmitItem::new(emit.export_name, emit.internal_variable))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.at(path.clone()))?;

    WorkflowDef::new(draft.name, draft.take_channels, body, emits).map_err(|e| e.at(path))
}

fn build_body(
    statements: Vec<StatementDraft>,
    parent: &NodePath,
    depth: usize,
) -> Result<Vec<Statement>> {
    statements
        .into_iter()
        .enumerate()
        .map(|(i, statement)| {
            let path = parent.child(i);
            build_statement(statement, &path, depth).map_err(|e| {
                if e.path.is_root() {
                    e.at(path.clone())
                } else {
                    e
                }
            })
        })
        .collect()
}

fn build_statement(statement: StatementDraft, path: &NodePath, depth: usize) -> Result<Statement> {
    match statement {
        StatementDraft::ProcessCall(call) => Ok(Statement::ProcessCall(ProcessCall::new(
            call.process_name,
            call.args,
            call.assign_to,
            call.output_attribute,
        )?)),
        StatementDraft::ChannelChain(chain) => {
            let steps = chain
                .steps
                .into_iter()
                .map(|step| Operator::parse(&step.operator, step.args, step.closure_lines))
                .collect::<Result<Vec<_>>>()?;
            Ok(Statement::ChannelChain(ChannelChain::new(
                chain.start_variable,
                steps,
                chain.set_variable,
            )?))
        }
        StatementDraft::Assignment(assignment) => Ok(Statement::Assignment(Assignment::new(
            assignment.variable,
            assignment.value,
        )?)),
        StatementDraft::Conditional(conditional) => {
            if depth + 1 > MAX_NESTING_DEPTH {
                return Err(ValidationError::new(
                    Rule::NestingDepth,
                    format!("conditionals nest deeper than {} levels", MAX_NESTING_DEPTH),
                ));
            }
            let body = build_body(conditional.body, path, depth + 1)?;
            Ok(Statement::Conditional(Conditional::new(
                conditional.condition,
                body,
            )?))
        }
    }
}
