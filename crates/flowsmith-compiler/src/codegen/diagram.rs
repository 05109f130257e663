//! Mermaid diagram generation
//!
//! Draws the validated tree as a `flowchart TD`: process and sub-workflow
//! calls, operator chains, data variables and global constants, with edges
//! inferred from the text that references each variable.

use super::node_id::NodeIdAllocator;
use super::program::render_argument;
use crate::error::RenderError;
use crate::semantic::ValidatedPipeline;
use flowsmith_core::ast::{
    Argument, Assignment, ChannelChain, Conditional, PipelineAst, ProcessCall, Statement,
    WorkflowDef, MAX_NESTING_DEPTH,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

const CLASS_DEFS: &[&str] = &[
    "classDef process fill:#e1f5fe,stroke:#01579b,stroke-width:2px;",
    "classDef subworkflow fill:#e8eaf6,stroke:#3f51b5,stroke-width:2px,stroke-dasharray: 5 5;",
    "classDef operator fill:#fff9c4,stroke:#fbc02d,stroke-width:2px,stroke-dasharray: 5 5;",
    "classDef data fill:#e0e0e0,stroke:#333,stroke-width:2px;",
    "classDef global fill:#f3e5f5,stroke:#7b1fa2,stroke-width:1px;",
];

const CONDITIONAL_STYLE: &str = "fill:#ffebee,stroke:#c62828,stroke-dasharray: 5 5";

/// Tokens never treated as variable references
const IGNORED_TOKENS: &[&str] = &[
    "mix", "join", "groupTuple", "collect", "map", "flatten", "cross", "multiMap", "true",
    "false", "null", "it", "get", "return", "branch", "file", "extractKey", "baseName",
    "simpleName", "id", "size", "exists", "toInteger", "toString", "view",
];

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_.]*").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeStyle {
    Solid,
    Dotted,
}

/// Quote-safe single-line label
fn label(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace('"', "'")
}

fn is_ignored(token: &str) -> bool {
    IGNORED_TOKENS.contains(&token)
}

/// Mermaid renderer
pub struct DiagramRenderer<'a> {
    ast: &'a PipelineAst,
    lines: Vec<String>,
    ids: NodeIdAllocator,
    registry: HashMap<String, String>,
    edges: HashSet<(String, String, Option<String>)>,
    workflow_names: HashSet<&'a str>,
    chain_count: usize,
    region_count: usize,
}

impl<'a> DiagramRenderer<'a> {
    /// Render the diagram for a validated pipeline
    pub fn render(pipeline: &ValidatedPipeline) -> Result<String, RenderError> {
        let ast = pipeline.ast();
        let mut renderer = DiagramRenderer {
            ast,
            lines: Vec::new(),
            ids: NodeIdAllocator::new(),
            registry: HashMap::new(),
            edges: HashSet::new(),
            workflow_names: ast
                .sub_workflows
                .iter()
                .chain(std::iter::once(&ast.main_workflow))
                .map(|wf| wf.name.as_str())
                .collect(),
            chain_count: 0,
            region_count: 0,
        };
        renderer.draw()?;

        let mut out = String::from("flowchart TD\n");
        for line in &renderer.lines {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
        Ok(out)
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        for class_def in CLASS_DEFS {
            self.lines.push(class_def.to_string());
        }

        let ast = self.ast;
        for global in &ast.globals {
            let id = self.ids.id_for(&format!("global:{}", global.name));
            self.lines
                .push(format!("{}[/\"{}\"/]:::global", id, label(&global.name)));
            self.registry.insert(global.name.clone(), id);
        }
        let pipeline_registry = self.registry.clone();

        for workflow in &ast.sub_workflows {
            self.registry = pipeline_registry.clone();
            let scope_id = self.ids.id_for(&format!("scope:wf:{}", workflow.name));
            self.lines.push(format!(
                "subgraph {} [\"Workflow: {}\"]",
                scope_id,
                label(&workflow.name)
            ));
            self.lines.push("direction TB".to_string());
            self.draw_workflow(workflow)?;
            self.lines.push("end".to_string());
        }

        self.registry = pipeline_registry.clone();
        let main_id = self.ids.id_for("scope:main");
        self.lines.push(format!(
            "subgraph {} [\"Main Workflow: {}\"]",
            main_id,
            label(&ast.main_workflow.name)
        ));
        self.lines.push("direction TB".to_string());
        self.draw_workflow(&ast.main_workflow)?;
        self.lines.push("end".to_string());

        if !ast.entrypoint.body.is_empty() {
            self.registry = pipeline_registry;
            let entry_id = self.ids.id_for("scope:entry");
            self.lines
                .push(format!("subgraph {} [\"Entrypoint\"]", entry_id));
            self.lines.push("direction TB".to_string());
            self.draw_body(&ast.entrypoint.body, "entry", 0)?;
            self.lines.push("end".to_string());
        }

        Ok(())
    }

    fn draw_workflow(&mut self, workflow: &WorkflowDef) -> Result<(), RenderError> {
        for input in &workflow.take_channels {
            let id = self
                .ids
                .id_for(&format!("input:{}:{}", workflow.name, input));
            self.lines.push(format!("{}([\"{}\"]):::data", id, label(input)));
            self.registry.insert(input.clone(), id);
        }

        self.draw_body(&workflow.body, &format!("wf:{}", workflow.name), 0)?;

        for emit in &workflow.emit_channels {
            let id = self
                .ids
                .id_for(&format!("emit:{}:{}", workflow.name, emit.export_name));
            self.lines
                .push(format!("{}>\"emit: {}\"]:::data", id, label(&emit.export_name)));
            self.link(emit.source(), &id, EdgeStyle::Solid);
        }
        Ok(())
    }

    fn draw_body(&mut self, body: &[Statement], scope: &str, depth: usize) -> Result<(), RenderError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(RenderError::NestingTooDeep(depth));
        }
        for statement in body {
            match statement {
                Statement::ProcessCall(call) => self.draw_call(call, scope),
                Statement::ChannelChain(chain) => self.draw_chain(chain, scope),
                Statement::Assignment(assignment) => self.draw_assignment(assignment, scope),
                Statement::Conditional(conditional) => {
                    self.draw_conditional(conditional, scope, depth)?
                }
            }
        }
        Ok(())
    }

    fn draw_call(&mut self, call: &ProcessCall, scope: &str) {
        let call_id = self
            .ids
            .id_for(&format!("call:{}:{}", scope, call.process_name));
        if self.workflow_names.contains(call.process_name.as_str()) {
            self.lines.push(format!(
                "{}[[\"{}\"]]:::subworkflow",
                call_id,
                label(&call.process_name)
            ));
        } else {
            self.lines.push(format!(
                "{}[\"{}\"]:::process",
                call_id,
                label(&call.process_name)
            ));
        }

        for arg in &call.args {
            match arg {
                Argument::Variable { name } => self.link(name, &call_id, EdgeStyle::Solid),
                literal => {
                    let text = render_argument(literal);
                    let const_id = self.ids.id_for(&format!("const:{}:{}", text, call_id));
                    let edge = (const_id.clone(), call_id.clone(), None);
                    if self.edges.insert(edge) {
                        self.lines
                            .push(format!("{}(\"{}\"):::global", const_id, label(&text)));
                        self.lines.push(format!("{} -.-> {}", const_id, call_id));
                    }
                }
            }
        }

        if let Some(binding) = &call.assign_to {
            let var_id = self
                .ids
                .id_for(&format!("var:{}:{}:{}", scope, binding, call_id));
            self.lines.push(format!("{}((\"{}\")):::data", var_id, label(binding)));
            self.edge(&call_id, &var_id, None, EdgeStyle::Solid);
            self.registry.insert(binding.clone(), var_id);
        }
        self.registry.insert(call.process_name.clone(), call_id);
    }

    fn draw_chain(&mut self, chain: &ChannelChain, scope: &str) {
        self.chain_count += 1;
        let op_id = self.ids.id_for(&format!(
            "chain:{}:{}:{}",
            scope, self.chain_count, chain.start_variable
        ));
        let names: Vec<&str> = chain.steps.iter().map(|op| op.operator.name()).collect();
        self.lines
            .push(format!("{}{{{{\"{}\"}}}}:::operator", op_id, names.join("<br/>")));

        self.link(&chain.start_variable, &op_id, EdgeStyle::Solid);
        for step in &chain.steps {
            for arg in &step.args {
                self.link(arg, &op_id, EdgeStyle::Dotted);
            }
            if !step.closure_lines.is_empty() {
                self.link(&step.closure_lines.join(" "), &op_id, EdgeStyle::Dotted);
            }
        }

        if let Some(target) = &chain.set_variable {
            let var_id = self
                .ids
                .id_for(&format!("var:{}:{}:{}", scope, target, op_id));
            self.lines.push(format!("{}((\"{}\")):::data", var_id, label(target)));
            self.edge(&op_id, &var_id, None, EdgeStyle::Solid);
            self.registry.insert(target.clone(), var_id);
        }
    }

    fn draw_assignment(&mut self, assignment: &Assignment, scope: &str) {
        let assign_id = self
            .ids
            .id_for(&format!("assign:{}:{}", scope, assignment.variable));
        if assignment.value.contains('(') && assignment.value.contains(')') {
            self.lines.push(format!(
                "{}[[\"{}\"]]:::process",
                assign_id,
                label(&assignment.value)
            ));
        } else {
            self.lines.push(format!(
                "{}[\"{}\"]:::operator",
                assign_id,
                label(&assignment.value)
            ));
        }

        self.link(&assignment.value, &assign_id, EdgeStyle::Solid);

        let var_id = self
            .ids
            .id_for(&format!("var:{}:{}:{}", scope, assignment.variable, assign_id));
        self.lines.push(format!(
            "{}((\"{}\")):::data",
            var_id,
            label(&assignment.variable)
        ));
        self.edge(&assign_id, &var_id, None, EdgeStyle::Solid);
        self.registry.insert(assignment.variable.clone(), var_id);
    }

    fn draw_conditional(
        &mut self,
        conditional: &Conditional,
        scope: &str,
        depth: usize,
    ) -> Result<(), RenderError> {
        self.region_count += 1;
        let region = format!("if:{}:{}:{}", scope, self.region_count, conditional.condition);
        let region_id = self.ids.id_for(&region);

        self.lines.push(format!(
            "subgraph {} [\"if {}\"]",
            region_id,
            label(&conditional.condition)
        ));
        self.lines.push("direction TB".to_string());
        self.draw_body(&conditional.body, &region_id, depth + 1)?;
        self.lines.push("end".to_string());
        self.lines
            .push(format!("style {} {}", region_id, CONDITIONAL_STYLE));
        Ok(())
    }

    /// Link every variable referenced by `fragment` to `target`
    fn link(&mut self, fragment: &str, target: &str, style: EdgeStyle) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }

        let is_call = fragment.contains('(') && fragment.contains(')');
        if !is_call && !fragment.contains(' ') {
            let mut parts = fragment.splitn(2, '.');
            let root = parts.next().unwrap_or_default();
            if let Some(source) = self.registry.get(root).cloned() {
                let suffix = parts.next().map(|s| format!(".{}", s));
                self.edge(&source, target, suffix, style);
                return;
            }
        }

        let tokens: Vec<String> = TOKEN
            .find_iter(fragment)
            .map(|m| m.as_str().to_string())
            .collect();
        for token in tokens {
            let mut parts: Vec<&str> = token.split('.').filter(|p| !p.is_empty()).collect();
            if parts.len() > 1 && parts.last().map(|p| is_ignored(p)).unwrap_or(false) {
                parts.pop();
            }
            let Some(root) = parts.first().copied() else {
                continue;
            };
            if is_ignored(root) {
                continue;
            }
            let Some(source) = self.registry.get(root).cloned() else {
                continue;
            };
            let suffix = if parts.len() > 1 {
                let rest = parts[1..].join(".");
                (!is_ignored(&rest)).then(|| format!(".{}", rest))
            } else {
                None
            };
            self.edge(&source, target, suffix, style);
        }
    }

    /// Emit each (source, target, label) edge at most once
    fn edge(&mut self, source: &str, target: &str, suffix: Option<String>, style: EdgeStyle) {
        if source == target {
            return;
        }
        let key = (source.to_string(), target.to_string(), suffix.clone());
        if !self.edges.insert(key) {
            return;
        }
        let line = match (suffix, style) {
            (Some(suffix), _) => format!("{} -- \"{}\" --> {}", source, label(&suffix), target),
            (None, EdgeStyle::Solid) => format!("{} --> {}", source, target),
            (None, EdgeStyle::Dotted) => format!("{} -.-> {}", source, target),
        };
        self.lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_escaping() {
        assert_eq!(label("a \"b\"\nc"), "a 'b' c");
    }

    #[test]
    fn test_ignored_tokens() {
        assert!(is_ignored("it"));
        assert!(is_ignored("collect"));
        assert!(!is_ignored("reads"));
    }
}
