//! Channel operators and their argument/closure classes

use crate::error::{Result, Rule, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator kinds accepted in a channel chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorKind {
    MultiMap,
    Branch,
    Map,
    GroupTuple,
    Join,
    Mix,
    Concat,
    Filter,
    Unique,
    Distinct,
    Collect,
    Cross,
    Buffer,
    Flatten,
    Transpose,
}

/// How an operator takes its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorClass {
    /// Requires closure lines, forbids arguments
    ClosureOnly,
    /// Requires arguments, forbids a closure
    Parametric,
    /// Either arguments or closure
    Flexible,
    /// No closure
    Structural,
}

impl OperatorClass {
    /// Whether `.op` must be written `.op()` when it carries no closure
    pub fn requires_invocation(&self) -> bool {
        matches!(self, OperatorClass::Flexible | OperatorClass::Structural)
    }
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 15] = [
        OperatorKind::MultiMap,
        OperatorKind::Branch,
        OperatorKind::Map,
        OperatorKind::GroupTuple,
        OperatorKind::Join,
        OperatorKind::Mix,
        OperatorKind::Concat,
        OperatorKind::Filter,
        OperatorKind::Unique,
        OperatorKind::Distinct,
        OperatorKind::Collect,
        OperatorKind::Cross,
        OperatorKind::Buffer,
        OperatorKind::Flatten,
        OperatorKind::Transpose,
    ];

    /// Name as written in the workflow language
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::MultiMap => "multiMap",
            OperatorKind::Branch => "branch",
            OperatorKind::Map => "map",
            OperatorKind::GroupTuple => "groupTuple",
            OperatorKind::Join => "join",
            OperatorKind::Mix => "mix",
            OperatorKind::Concat => "concat",
            OperatorKind::Filter => "filter",
            OperatorKind::Unique => "unique",
            OperatorKind::Distinct => "distinct",
            OperatorKind::Collect => "collect",
            OperatorKind::Cross => "cross",
            OperatorKind::Buffer => "buffer",
            OperatorKind::Flatten => "flatten",
            OperatorKind::Transpose => "transpose",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn class(&self) -> OperatorClass {
        use OperatorKind::*;
        match self {
            MultiMap | Branch | Map => OperatorClass::ClosureOnly,
            GroupTuple | Join | Mix | Concat => OperatorClass::Parametric,
            Filter | Unique | Distinct | Collect | Cross | Buffer => OperatorClass::Flexible,
            Flatten | Transpose => OperatorClass::Structural,
        }
    }

    /// Flexible operators that are meaningless without content
    pub fn requires_content(&self) -> bool {
        matches!(self, OperatorKind::Filter)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of a channel chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operator {
    pub operator: OperatorKind,

    /// Positional arguments, rendered verbatim
    pub args: Vec<String>,

    /// Closure body lines, rendered verbatim
    pub closure_lines: Vec<String>,
}

impl Operator {
    /// Build an operator, checking argument/closure emptiness against its class
    pub fn new(operator: OperatorKind, args: Vec<String>, closure_lines: Vec<String>) -> Result<Self> {
        let has_args = !args.is_empty();
        let has_closure = !closure_lines.is_empty();

        let problem = match operator.class() {
            OperatorClass::ClosureOnly if !has_closure => Some("requires closure_lines"),
            OperatorClass::ClosureOnly if has_args => Some("does not accept args"),
            OperatorClass::Parametric if !has_args => Some("requires args"),
            OperatorClass::Parametric if has_closure => Some("does not accept closure_lines"),
            OperatorClass::Flexible if operator.requires_content() && !has_args && !has_closure => {
                Some("requires args or closure_lines")
            }
            OperatorClass::Structural if has_closure => Some("does not accept closure_lines"),
            _ => None,
        };

        if let Some(problem) = problem {
            return Err(ValidationError::new(
                Rule::OperatorShape,
                format!("operator '{}' {}", operator, problem),
            ));
        }

        Ok(Operator {
            operator,
            args,
            closure_lines,
        })
    }

    /// Resolve an operator by name and build it
    pub fn parse(name: &str, args: Vec<String>, closure_lines: Vec<String>) -> Result<Self> {
        let kind = OperatorKind::from_name(name.trim()).ok_or_else(|| {
            ValidationError::new(
                Rule::UnknownOperator,
                format!("unknown channel operator '{}'", name),
            )
        })?;
        Operator::new(kind, args, closure_lines)
    }

    pub fn class(&self) -> OperatorClass {
        self.operator.class()
    }
}
