//! Linear, append-only symbol scope

use flowsmith_core::ast::ident::{is_implicit_root, is_literal, leading_identifier};
use flowsmith_core::PipelineAst;
use std::collections::HashSet;

/// Names visible at one point of a workflow body
#[derive(Debug, Clone, Default)]
pub struct Scope {
    names: HashSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names every workflow of `ast` can see: globals, imports after alias
    /// resolution, sub-workflows and inline processes
    pub fn for_pipeline(ast: &PipelineAst) -> Self {
        let mut scope = Scope::new();
        for global in &ast.globals {
            scope.bind(&global.name);
        }
        for name in ast.imported_names() {
            scope.bind(name);
        }
        for workflow in &ast.sub_workflows {
            scope.bind(&workflow.name);
        }
        for process in &ast.processes {
            scope.bind(&process.name);
        }
        scope
    }

    pub fn bind(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether the leading identifier of `reference` is visible
    ///
    /// Literals reference nothing and always resolve. Any other text must
    /// start with a bound name or an implicit root.
    pub fn resolves(&self, reference: &str) -> bool {
        if is_literal(reference) {
            return true;
        }
        match leading_identifier(reference) {
            Some(root) => is_implicit_root(root) || self.contains(root),
            None => false,
        }
    }
}
