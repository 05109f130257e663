//! Semantic validator
//!
//! Whole-tree checks that cannot be decided from a node's local shape:
//! scope resolution, emit resolution, the entrypoint restriction, the
//! connectivity guarantee and the misplaced-logic guard.

use super::scope::Scope;
use flowsmith_core::ast::ident::leading_identifier;
use flowsmith_core::ast::{
    Argument, EntrypointDef, PipelineAst, ProcessCall, Statement, WorkflowDef,
};
use flowsmith_core::{NodePath, Rule, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, ValidationError>;

const LOGIC_KEYWORDS: &[&str] = &["prepare", "logic"];

/// How unresolvable emits are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Unresolvable emits fail validation
    Strict,
    /// Unresolvable emits are dropped
    #[default]
    Lenient,
}

/// A tree that passed semantic validation
///
/// Only [`SemanticValidator::validate`] produces this type; both renderers
/// require it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedPipeline {
    ast: PipelineAst,
}

impl ValidatedPipeline {
    pub fn ast(&self) -> &PipelineAst {
        &self.ast
    }

    pub fn into_inner(self) -> PipelineAst {
        self.ast
    }
}

impl AsRef<PipelineAst> for ValidatedPipeline {
    fn as_ref(&self) -> &PipelineAst {
        &self.ast
    }
}

/// Semantic validator
#[derive(Debug, Clone, Default)]
pub struct SemanticValidator {
    emit_mode: EmitMode,
}

impl SemanticValidator {
    pub fn new(emit_mode: EmitMode) -> Self {
        Self { emit_mode }
    }

    /// Validate a constructed tree, applying emit pruning and entrypoint
    /// synthesis
    pub fn validate(&self, mut ast: PipelineAst) -> Result<ValidatedPipeline> {
        check_process_placement(&ast)?;

        let pipeline_scope = Scope::for_pipeline(&ast);
        for workflow in ast.sub_workflows.iter_mut() {
            self.validate_workflow(workflow, &pipeline_scope)?;
        }
        self.validate_workflow(&mut ast.main_workflow, &pipeline_scope)?;

        check_entrypoint(&ast.entrypoint)?;
        ensure_connectivity(&mut ast)?;

        let mut entry_scope = pipeline_scope;
        entry_scope.bind(&ast.main_workflow.name);
        scan_body(
            &mut entry_scope,
            &ast.entrypoint.body,
            &NodePath::scope("entrypoint"),
        )?;

        debug!("pipeline '{}' validated", ast.main_workflow.name);
        Ok(ValidatedPipeline { ast })
    }

    fn validate_workflow(&self, workflow: &mut WorkflowDef, pipeline_scope: &Scope) -> Result<()> {
        let path = NodePath::scope(format!("workflow '{}'", workflow.name));

        let mut scope = pipeline_scope.clone();
        for input in &workflow.take_channels {
            scope.bind(input);
        }
        scan_body(&mut scope, &workflow.body, &path)?;

        let mut kept = Vec::with_capacity(workflow.emit_channels.len());
        for emit in workflow.emit_channels.drain(..) {
            if scope.resolves(emit.source()) {
                kept.push(emit);
                continue;
            }
            match self.emit_mode {
                EmitMode::Strict => {
                    return Err(ValidationError::new(
                        Rule::UnresolvedEmit,
                        format!(
                            "emit '{}' reads '{}', which is not defined in workflow '{}'",
                            emit.export_name,
                            emit.source(),
                            workflow.name
                        ),
                    )
                    .at(path));
                }
                EmitMode::Lenient => {
                    warn!(
                        "dropping emit '{}' of workflow '{}': source '{}' is undefined",
                        emit.export_name,
                        workflow.name,
                        emit.source()
                    );
                }
            }
        }
        workflow.emit_channels = kept;

        Ok(())
    }
}

fn require(scope: &Scope, reference: &str, role: &str, path: &NodePath) -> Result<()> {
    if scope.resolves(reference) {
        return Ok(());
    }
    Err(ValidationError::new(
        Rule::UnresolvedReference,
        format!(
            "{} '{}' references '{}' before it is defined",
            role,
            reference,
            leading_identifier(reference).unwrap_or(reference)
        ),
    )
    .at(path.clone()))
}

/// Scan statements in order, growing the scope as names are bound
fn scan_body(scope: &mut Scope, body: &[Statement], parent: &NodePath) -> Result<()> {
    for (i, statement) in body.iter().enumerate() {
        let path = parent.child(i);
        match statement {
            Statement::ProcessCall(call) => {
                require(scope, &call.process_name, "call target", &path)?;
                for arg in &call.args {
                    if let Argument::Variable { name } = arg {
                        require(scope, name, "argument", &path)?;
                    }
                }
                if let Some(binding) = &call.assign_to {
                    scope.bind(binding);
                }
                scope.bind(&call.process_name);
            }
            Statement::ChannelChain(chain) => {
                require(scope, &chain.start_variable, "chain start", &path)?;
                if let Some(target) = &chain.set_variable {
                    scope.bind(target);
                }
            }
            Statement::Assignment(assignment) => {
                require(scope, &assignment.value, "assignment value", &path)?;
                scope.bind(&assignment.variable);
            }
            Statement::Conditional(conditional) => {
                scan_body(scope, &conditional.body, &path)?;
            }
        }
    }
    Ok(())
}

fn check_process_placement(ast: &PipelineAst) -> Result<()> {
    for process in &ast.processes {
        if process.has_declarations() {
            continue;
        }
        let lowered = process.name.to_lowercase();
        if LOGIC_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            return Err(ValidationError::new(
                Rule::MisplacedLogic,
                format!(
                    "'{}' has no inputs or outputs and looks like data preparation logic; \
                     define it as a sub-workflow",
                    process.name
                ),
            )
            .at(NodePath::scope(format!("process '{}'", process.name))));
        }
    }
    Ok(())
}

fn check_entrypoint(entrypoint: &EntrypointDef) -> Result<()> {
    fn find_chain(body: &[Statement], parent: &NodePath) -> Result<()> {
        for (i, statement) in body.iter().enumerate() {
            let path = parent.child(i);
            match statement {
                Statement::ChannelChain(chain) => {
                    return Err(ValidationError::new(
                        Rule::EntrypointChain,
                        format!(
                            "entrypoint contains a channel chain on '{}' with operators {}",
                            chain.start_variable,
                            chain.operator_list()
                        ),
                    )
                    .at(path));
                }
                Statement::Conditional(conditional) => find_chain(&conditional.body, &path)?,
                _ => {}
            }
        }
        Ok(())
    }

    find_chain(&entrypoint.body, &NodePath::scope("entrypoint"))
}

/// An empty entrypoint with a zero-input main workflow calls the main
/// workflow
fn ensure_connectivity(ast: &mut PipelineAst) -> Result<()> {
    if ast.entrypoint.body.is_empty() && ast.main_workflow.take_channels.is_empty() {
        let call = ProcessCall::new(ast.main_workflow.name.clone(), Vec::new(), None, None)
            .map_err(|e| e.at(NodePath::scope("entrypoint")))?;
        debug!("synthesized entrypoint call to '{}'", call.process_name);
        ast.entrypoint.body.push(Statement::ProcessCall(call));
    }
    Ok(())
}
