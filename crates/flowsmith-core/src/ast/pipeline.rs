//! Pipeline-level definitions: imports, globals, processes, workflows

use super::ident::{
    is_all_uppercase, is_emit_source, is_identifier, HELPER_NAMESPACE, STANDARD_TOOL_PREFIX,
    TOOL_NAMESPACE,
};
use super::statement::Statement;
use crate::error::{Result, Rule, ValidationError};
use serde::{Serialize, Serializer};
use std::fmt;

/// Workflow-level tokens that may not appear inside a process script
pub const SCRIPT_FORBIDDEN_TOKENS: &[&str] =
    &["workflow", ".cross(", ".join(", ".multiMap", ".map{", ".mix("];

/// Root of a validated tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineAst {
    pub imports: Vec<ImportSpec>,
    pub globals: Vec<GlobalDef>,
    pub processes: Vec<ProcessDef>,
    pub sub_workflows: Vec<WorkflowDef>,
    pub main_workflow: WorkflowDef,
    pub entrypoint: EntrypointDef,
}

impl PipelineAst {
    pub fn sub_workflow(&self, name: &str) -> Option<&WorkflowDef> {
        self.sub_workflows.iter().find(|wf| wf.name == name)
    }

    /// Local names introduced by imports, after alias resolution
    pub fn imported_names(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .flat_map(|import| import.functions.iter().map(ImportedSymbol::local_name))
    }
}

/// Imported symbol, optionally aliased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSymbol {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedSymbol {
    /// Parse `Name` or `Name as Alias`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let parts: Vec<&str> = text.split(" as ").map(str::trim).collect();

        let (name, alias) = match parts.as_slice() {
            [name] => (*name, None),
            [name, alias] => (*name, Some(*alias)),
            _ => {
                return Err(ValidationError::new(
                    Rule::ImportAlias,
                    format!("malformed import symbol '{}'", text),
                ))
            }
        };

        if name.is_empty() || alias.map(str::is_empty).unwrap_or(false) {
            return Err(ValidationError::new(
                Rule::ImportAlias,
                format!("malformed import symbol '{}'", text),
            ));
        }

        for part in std::iter::once(name).chain(alias) {
            if !is_identifier(part) {
                return Err(ValidationError::new(
                    Rule::Identifier,
                    format!("imported name '{}' is not a valid identifier", part),
                ));
            }
        }

        Ok(ImportedSymbol {
            name: name.to_string(),
            alias: alias.map(str::to_string),
        })
    }

    /// Name visible to the importing pipeline
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for ImportedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for ImportedSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `include { ... } from '<module_path>'`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSpec {
    pub module_path: String,
    pub functions: Vec<ImportedSymbol>,
}

impl ImportSpec {
    pub fn new(module_path: impl Into<String>, functions: Vec<ImportedSymbol>) -> Result<Self> {
        let module_path = module_path.into();
        if !module_path.starts_with(TOOL_NAMESPACE) && !module_path.starts_with(HELPER_NAMESPACE) {
            return Err(ValidationError::new(
                Rule::ImportNamespace,
                format!(
                    "module path '{}' must start with '{}' or '{}'",
                    module_path, TOOL_NAMESPACE, HELPER_NAMESPACE
                ),
            ));
        }
        Ok(ImportSpec {
            module_path,
            functions,
        })
    }
}

/// Global constant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalDef {
    pub name: String,
    pub value: String,
}

impl GlobalDef {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(ValidationError::new(
                Rule::Identifier,
                format!("global name '{}' is not a valid identifier", name),
            ));
        }
        Ok(GlobalDef {
            name,
            value: value.into(),
        })
    }
}

/// Inline shell process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDef {
    pub name: String,
    pub container: Option<String>,
    pub input_declarations: Vec<String>,
    pub output_declarations: Vec<String>,
    pub script_block: String,
}

impl ProcessDef {
    pub fn new(
        name: impl Into<String>,
        container: Option<String>,
        input_declarations: Vec<String>,
        output_declarations: Vec<String>,
        script_block: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let script_block = script_block.into();

        if !is_identifier(&name) {
            return Err(ValidationError::new(
                Rule::Identifier,
                format!("process name '{}' is not a valid identifier", name),
            ));
        }
        if name.starts_with(STANDARD_TOOL_PREFIX) {
            return Err(ValidationError::new(
                Rule::InlineStandardTool,
                format!(
                    "process '{}' uses the standard tool prefix and must be imported",
                    name
                ),
            ));
        }
        if is_all_uppercase(&name) {
            return Err(ValidationError::new(
                Rule::UppercaseProcess,
                format!("process '{}' is all-uppercase, which is reserved for constants", name),
            ));
        }
        if let Some(token) = SCRIPT_FORBIDDEN_TOKENS
            .iter()
            .find(|token| script_block.contains(*token))
        {
            return Err(ValidationError::new(
                Rule::ScriptChannelSyntax,
                format!("script of process '{}' contains workflow syntax '{}'", name, token),
            ));
        }

        Ok(ProcessDef {
            name,
            container,
            input_declarations,
            output_declarations,
            script_block,
        })
    }

    pub fn has_declarations(&self) -> bool {
        !self.input_declarations.is_empty() || !self.output_declarations.is_empty()
    }
}

/// Declared workflow output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmitItem {
    pub export_name: String,
    pub internal_variable: Option<String>,
}

impl EmitItem {
    pub fn new(export_name: impl Into<String>, internal_variable: Option<String>) -> Result<Self> {
        let export_name = export_name.into();

        if !is_identifier(&export_name) {
            return Err(ValidationError::new(
                Rule::EmitExportName,
                format!(
                    "export name '{}' must be a bare identifier without dots",
                    export_name
                ),
            ));
        }

        let internal_variable = internal_variable.map(|v| v.trim().to_string());
        if let Some(source) = &internal_variable {
            if !is_emit_source(source) {
                return Err(ValidationError::new(
                    Rule::EmitSourcePath,
                    format!("invalid emit source path '{}'", source),
                ));
            }
        }

        Ok(EmitItem {
            export_name,
            internal_variable,
        })
    }

    /// Internal path if present, else the export name
    pub fn source(&self) -> &str {
        self.internal_variable.as_deref().unwrap_or(&self.export_name)
    }
}

/// Sub-workflow or main workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowDef {
    pub name: String,
    pub take_channels: Vec<String>,
    pub body: Vec<Statement>,
    pub emit_channels: Vec<EmitItem>,
}

impl WorkflowDef {
    pub fn new(
        name: impl Into<String>,
        take_channels: Vec<String>,
        body: Vec<Statement>,
        emit_channels: Vec<EmitItem>,
    ) -> Result<Self> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(ValidationError::new(
                Rule::Identifier,
                format!("workflow name '{}' is not a valid identifier", name),
            ));
        }
        if let Some(input) = take_channels.iter().find(|input| !is_identifier(input)) {
            return Err(ValidationError::new(
                Rule::Identifier,
                format!("input '{}' of workflow '{}' is not a valid identifier", input, name),
            ));
        }
        Ok(WorkflowDef {
            name,
            take_channels,
            body,
            emit_channels,
        })
    }
}

/// Anonymous entry workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntrypointDef {
    pub body: Vec<Statement>,
}
