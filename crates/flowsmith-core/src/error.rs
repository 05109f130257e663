//! Structured validation errors for Flowsmith
//!
//! Every construction or validation failure collapses into one
//! [`ValidationError`]: the error kind, the failing rule, the offending node
//! path and a message. The repair loop turns this payload into corrective
//! feedback for the generator.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Local node shape violation
    SchemaViolation,
    /// Unresolved reference
    ScopeError,
    /// Invalid identifier or naming convention
    NamingError,
    /// Condition string failed the syntax guard
    ConditionSyntaxError,
    /// Disallowed complexity or misplaced logic
    ArchitectureError,
    /// Unreachable emit or source
    ConnectivityError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SchemaViolation => "SchemaViolation",
            ErrorKind::ScopeError => "ScopeError",
            ErrorKind::NamingError => "NamingError",
            ErrorKind::ConditionSyntaxError => "ConditionSyntaxError",
            ErrorKind::ArchitectureError => "ArchitectureError",
            ErrorKind::ConnectivityError => "ConnectivityError",
        };
        f.write_str(name)
    }
}

/// Rules enforced during construction and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    // Schema
    MalformedDraft,
    ImportNamespace,
    ImportAlias,
    UnknownOperator,
    OperatorShape,
    EmptyChain,
    ChainStart,
    ChainSelfBinding,
    StandardToolArgs,
    AccessorWithoutBinding,
    AssignmentHidesCall,
    AssignmentHidesChain,
    NestingDepth,

    // Naming
    Identifier,
    InlineStandardTool,
    UppercaseProcess,
    EmitExportName,
    EmitSourcePath,

    // Architecture
    ScriptChannelSyntax,
    EntrypointChain,
    MisplacedLogic,

    // Conditions
    EmptyCondition,
    UnbalancedParentheses,
    SingleEquals,

    // Scope
    UnresolvedReference,

    // Connectivity
    UnresolvedEmit,
}

impl Rule {
    /// Error kind this rule reports under
    pub fn kind(&self) -> ErrorKind {
        use Rule::*;
        match self {
            MalformedDraft | ImportNamespace | ImportAlias | UnknownOperator | OperatorShape
            | EmptyChain | ChainStart | ChainSelfBinding | StandardToolArgs
            | AccessorWithoutBinding | AssignmentHidesCall | AssignmentHidesChain
            | NestingDepth => ErrorKind::SchemaViolation,
            Identifier | InlineStandardTool | UppercaseProcess | EmitExportName
            | EmitSourcePath => ErrorKind::NamingError,
            ScriptChannelSyntax | EntrypointChain | MisplacedLogic => ErrorKind::ArchitectureError,
            EmptyCondition | UnbalancedParentheses | SingleEquals => {
                ErrorKind::ConditionSyntaxError
            }
            UnresolvedReference => ErrorKind::ScopeError,
            UnresolvedEmit => ErrorKind::ConnectivityError,
        }
    }

    /// Stable rule id, e.g. `schema.operator-shape`
    pub fn id(&self) -> &'static str {
        use Rule::*;
        match self {
            MalformedDraft => "schema.malformed-draft",
            ImportNamespace => "schema.import-namespace",
            ImportAlias => "schema.import-alias",
            UnknownOperator => "schema.unknown-operator",
            OperatorShape => "schema.operator-shape",
            EmptyChain => "schema.empty-chain",
            ChainStart => "schema.chain-start",
            ChainSelfBinding => "schema.chain-self-binding",
            StandardToolArgs => "schema.standard-tool-args",
            AccessorWithoutBinding => "schema.accessor-without-binding",
            AssignmentHidesCall => "schema.assignment-hides-call",
            AssignmentHidesChain => "schema.assignment-hides-chain",
            NestingDepth => "schema.nesting-depth",
            Identifier => "naming.identifier",
            InlineStandardTool => "naming.inline-standard-tool",
            UppercaseProcess => "naming.uppercase-process",
            EmitExportName => "naming.emit-export-name",
            EmitSourcePath => "naming.emit-source-path",
            ScriptChannelSyntax => "architecture.script-channel-syntax",
            EntrypointChain => "architecture.entrypoint-chain",
            MisplacedLogic => "architecture.misplaced-logic",
            EmptyCondition => "condition.empty",
            UnbalancedParentheses => "condition.unbalanced-parentheses",
            SingleEquals => "condition.single-equals",
            UnresolvedReference => "scope.unresolved-reference",
            UnresolvedEmit => "connectivity.unresolved-emit",
        }
    }

    /// Remediation text handed back to the generator
    pub fn remediation(&self) -> &'static str {
        use Rule::*;
        match self {
            MalformedDraft => {
                "Return exactly one JSON object with the fields imports, globals, processes, \
                 sub_workflows, main_workflow and entrypoint. Every statement needs a 'type' of \
                 process_call, channel_chain, assignment or conditional."
            }
            ImportNamespace => {
                "Import module paths must start with '../steps/' (tools) or '../functions/' \
                 (helpers)."
            }
            ImportAlias => "Write aliased imports as 'Original as Alias' with both names present.",
            UnknownOperator => {
                "Use only supported channel operators: map, multiMap, branch, groupTuple, join, \
                 mix, concat, filter, unique, distinct, collect, cross, buffer, flatten, \
                 transpose. Use set_variable instead of a 'set' step."
            }
            OperatorShape => {
                "map, multiMap and branch need closure_lines and no args. groupTuple, join, mix \
                 and concat need args and no closure. filter needs args or closure_lines. \
                 flatten and transpose take no closure."
            }
            EmptyChain => "A channel_chain must contain at least one operator step.",
            ChainStart => {
                "start_variable must be a variable, a dotted path (e.g. 'ALIGN.out.bam'), a \
                 Channel factory call or a plain function call."
            }
            ChainSelfBinding => {
                "set_variable must differ from start_variable. Bind the result to a new name."
            }
            StandardToolArgs => {
                "Calls to imported 'step_' tools must pass their input channels as arguments."
            }
            AccessorWithoutBinding => {
                "output_attribute requires assign_to. Bind the call result to a variable or \
                 declare the output in emit_channels."
            }
            AssignmentHidesCall => {
                "Do not hide a tool invocation inside an assignment. Use a process_call node \
                 with assign_to."
            }
            AssignmentHidesChain => {
                "Do not hide channel operators inside an assignment. Use a channel_chain node \
                 with set_variable."
            }
            NestingDepth => "Flatten nested conditionals; the body is nested too deeply.",
            Identifier => {
                "Names must be valid identifiers: letters, digits and underscores, not starting \
                 with a digit."
            }
            InlineStandardTool => {
                "Processes named 'step_*' are standard tools. Import them from '../steps/' \
                 instead of defining them inline."
            }
            UppercaseProcess => {
                "All-uppercase names are reserved for constants. Give inline processes a mixed \
                 or lower-case name."
            }
            EmitExportName => {
                "export_name must be a bare identifier. Put dotted sources in internal_variable."
            }
            EmitSourcePath => {
                "internal_variable must be a dotted identifier path such as 'ALIGN.out.bam'."
            }
            ScriptChannelSyntax => {
                "Process scripts must not contain workflow syntax or channel operators. Move \
                 that logic into a sub-workflow body."
            }
            EntrypointChain => {
                "The entrypoint may only call the main workflow. Move channel chains into the \
                 main workflow or a sub-workflow."
            }
            MisplacedLogic => {
                "Data preparation logic must be a sub-workflow with channel chains, not an \
                 inline process without inputs or outputs."
            }
            EmptyCondition => "Conditionals need a non-empty condition expression.",
            UnbalancedParentheses => "Balance every '(' in the condition with a ')'.",
            SingleEquals => "Use '==' for comparison in conditions; '=' is assignment.",
            UnresolvedReference => {
                "Every referenced name must be a declared input, global, import, sibling \
                 workflow or process, or bound by an earlier statement."
            }
            UnresolvedEmit => {
                "Emit only channels that exist in the workflow: declared inputs or names bound \
                 in the body."
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// Location of a node inside the tree
///
/// Renders as `workflow 'MAIN' statement 2.0` where each dotted index
/// descends one conditional body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodePath {
    /// Enclosing definition, e.g. `workflow 'MAIN'` or `imports[0]`
    pub scope: Option<String>,

    /// Statement indices from the outermost body inwards
    pub statement: Vec<usize>,
}

impl NodePath {
    /// Path at the pipeline root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path naming an enclosing definition
    pub fn scope(scope: impl Into<String>) -> Self {
        NodePath {
            scope: Some(scope.into()),
            statement: Vec::new(),
        }
    }

    /// Path of the `index`th statement below this one
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.statement.push(index);
        path
    }

    pub fn is_root(&self) -> bool {
        self.scope.is_none() && self.statement.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => f.write_str(scope)?,
            None => f.write_str("pipeline")?,
        }
        if !self.statement.is_empty() {
            let indices: Vec<String> = self.statement.iter().map(|i| i.to_string()).collect();
            write!(f, " statement {}", indices.join("."))?;
        }
        Ok(())
    }
}

/// One structured construction or validation failure
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind} [{rule}] at {path}: {message}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub rule: Rule,
    pub path: NodePath,
    pub message: String,
}

impl ValidationError {
    /// Create an error for `rule` at the pipeline root
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        ValidationError {
            kind: rule.kind(),
            rule,
            path: NodePath::root(),
            message: message.into(),
        }
    }

    /// Attach the offending node path
    pub fn at(mut self, path: NodePath) -> Self {
        self.path = path;
        self
    }

    pub fn remediation(&self) -> &'static str {
        self.rule.remediation()
    }

    /// Multi-line description used as repair feedback
    pub fn feedback(&self) -> String {
        format!(
            "ERROR KIND: {}\nRULE: {}\nLOCATION: {}\nPROBLEM: {}\nFIX: {}",
            self.kind,
            self.rule,
            self.path,
            self.message,
            self.remediation()
        )
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;
