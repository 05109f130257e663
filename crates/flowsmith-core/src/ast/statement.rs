//! Workflow body statements

use super::ident::{
    is_channel_factory_call, is_channel_factory_expr, is_dotted_path, is_function_call,
    is_identifier, STANDARD_TOOL_PREFIX,
};
use super::operator::Operator;
use crate::error::{Result, Rule, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum conditional nesting below a workflow body
pub const MAX_NESTING_DEPTH: usize = 16;

/// One statement of a workflow or entrypoint body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    ProcessCall(ProcessCall),
    ChannelChain(ChannelChain),
    Assignment(Assignment),
    Conditional(Conditional),
}

impl Statement {
    pub fn type_name(&self) -> &'static str {
        match self {
            Statement::ProcessCall(_) => "process_call",
            Statement::ChannelChain(_) => "channel_chain",
            Statement::Assignment(_) => "assignment",
            Statement::Conditional(_) => "conditional",
        }
    }
}

/// Literal value of a numeric argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    Bool(bool),
    Number(serde_json::Number),
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Bool(b) => write!(f, "{}", b),
            NumericValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Typed positional argument of a process call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Argument {
    #[serde(rename = "variable")]
    Variable { name: String },

    #[serde(rename = "string")]
    StringLiteral { value: String },

    #[serde(rename = "numeric")]
    NumericLiteral { value: NumericValue },
}

impl Argument {
    pub fn variable(name: impl Into<String>) -> Self {
        Argument::Variable { name: name.into() }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Argument::StringLiteral {
            value: value.into(),
        }
    }

    /// Classify untyped argument text: quoted text is a string, integer or
    /// float text is numeric, `true`/`false` are booleans, anything else is
    /// a variable reference
    pub fn infer(text: &str) -> Self {
        let text = text.trim();

        for quote in ['\'', '"'] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                return Argument::string(&text[1..text.len() - 1]);
            }
        }

        match text {
            "true" => {
                return Argument::NumericLiteral {
                    value: NumericValue::Bool(true),
                }
            }
            "false" => {
                return Argument::NumericLiteral {
                    value: NumericValue::Bool(false),
                }
            }
            _ => {}
        }

        if let Ok(int) = text.parse::<i64>() {
            return Argument::NumericLiteral {
                value: NumericValue::Number(int.into()),
            };
        }
        if let Some(number) = text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            if text.chars().any(|c| c.is_ascii_digit()) {
                return Argument::NumericLiteral {
                    value: NumericValue::Number(number),
                };
            }
        }

        Argument::variable(text)
    }
}

/// Invocation of a process, imported tool or sub-workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessCall {
    pub process_name: String,
    pub args: Vec<Argument>,
    pub assign_to: Option<String>,
    pub output_attribute: Option<String>,
}

impl ProcessCall {
    pub fn new(
        process_name: impl Into<String>,
        args: Vec<Argument>,
        assign_to: Option<String>,
        output_attribute: Option<String>,
    ) -> Result<Self> {
        let process_name = process_name.into();

        if !is_identifier(&process_name) {
            return Err(ValidationError::new(
                Rule::Identifier,
                format!("call target '{}' is not a valid identifier", process_name),
            ));
        }

        if process_name.starts_with(STANDARD_TOOL_PREFIX) && args.is_empty() {
            return Err(ValidationError::new(
                Rule::StandardToolArgs,
                format!(
                    "standard tool '{}' is called without arguments; it needs at least one input",
                    process_name
                ),
            ));
        }

        if let Some(attribute) = &output_attribute {
            if assign_to.is_none() {
                return Err(ValidationError::new(
                    Rule::AccessorWithoutBinding,
                    format!(
                        "'{}' requests output '{}' but assigns it to nothing",
                        process_name, attribute
                    ),
                ));
            }
        }

        if let Some(binding) = &assign_to {
            if !is_identifier(binding) {
                return Err(ValidationError::new(
                    Rule::Identifier,
                    format!("result binding '{}' is not a valid identifier", binding),
                ));
            }
        }

        Ok(ProcessCall {
            process_name,
            args,
            assign_to,
            output_attribute,
        })
    }
}

/// Start expression followed by channel operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelChain {
    pub start_variable: String,
    pub steps: Vec<Operator>,
    pub set_variable: Option<String>,
}

impl ChannelChain {
    pub fn new(
        start_variable: impl Into<String>,
        steps: Vec<Operator>,
        set_variable: Option<String>,
    ) -> Result<Self> {
        let start_variable = start_variable.into().trim().to_string();

        if is_channel_factory_expr(&start_variable) && !is_channel_factory_call(&start_variable) {
            return Err(ValidationError::new(
                Rule::ChainStart,
                format!("unsupported channel factory in '{}'", start_variable),
            ));
        }

        let valid_start = is_channel_factory_call(&start_variable)
            || is_dotted_path(&start_variable)
            || is_function_call(&start_variable);
        if !valid_start {
            return Err(ValidationError::new(
                Rule::ChainStart,
                format!("invalid chain start expression '{}'", start_variable),
            ));
        }

        if steps.is_empty() {
            return Err(ValidationError::new(
                Rule::EmptyChain,
                format!("chain starting at '{}' has no operator steps", start_variable),
            ));
        }

        if let Some(target) = &set_variable {
            if !is_identifier(target) {
                return Err(ValidationError::new(
                    Rule::Identifier,
                    format!("set_variable '{}' is not a valid identifier", target),
                ));
            }
            if *target == start_variable {
                return Err(ValidationError::new(
                    Rule::ChainSelfBinding,
                    format!("chain rebinds its own start '{}'", start_variable),
                ));
            }
        }

        Ok(ChannelChain {
            start_variable,
            steps,
            set_variable,
        })
    }

    /// Operator names in order, e.g. `[map, filter]`
    pub fn operator_list(&self) -> String {
        let names: Vec<&str> = self.steps.iter().map(|op| op.operator.name()).collect();
        format!("[{}]", names.join(", "))
    }
}

/// Plain `variable = expression`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub variable: String,
    pub value: String,
}

const CHAIN_TOKENS: &[&str] = &[".map", ".cross", ".multiMap", ".branch"];

impl Assignment {
    pub fn new(variable: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let variable = variable.into();
        let value = value.into();

        if !is_identifier(&variable) {
            return Err(ValidationError::new(
                Rule::Identifier,
                format!("assignment target '{}' is not a valid identifier", variable),
            ));
        }

        if value.contains(STANDARD_TOOL_PREFIX) && value.contains('(') {
            return Err(ValidationError::new(
                Rule::AssignmentHidesCall,
                format!("assignment '{} = {}' hides a tool invocation", variable, value),
            ));
        }

        if let Some(token) = CHAIN_TOKENS.iter().find(|token| value.contains(*token)) {
            return Err(ValidationError::new(
                Rule::AssignmentHidesChain,
                format!(
                    "assignment '{} = {}' hides channel operator '{}'",
                    variable, value, token
                ),
            ));
        }

        Ok(Assignment { variable, value })
    }
}

/// `if (condition) { body }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditional {
    pub condition: String,
    pub body: Vec<Statement>,
}

impl Conditional {
    pub fn new(condition: impl Into<String>, body: Vec<Statement>) -> Result<Self> {
        let condition = condition.into().trim().to_string();
        check_condition(&condition)?;
        Ok(Conditional { condition, body })
    }
}

/// Heuristic guard over condition text
pub fn check_condition(condition: &str) -> Result<()> {
    if condition.is_empty() {
        return Err(ValidationError::new(
            Rule::EmptyCondition,
            "condition string is empty",
        ));
    }

    let mut depth: i32 = 0;
    for c in condition.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ValidationError::new(
            Rule::UnbalancedParentheses,
            format!("unbalanced parentheses in condition '{}'", condition),
        ));
    }

    let chars: Vec<char> = condition.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if *c != '=' {
            continue;
        }
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();
        let joined_before = matches!(prev, Some('=' | '!' | '<' | '>'));
        let joined_after = matches!(next, Some('=' | '~'));
        if !joined_before && !joined_after {
            return Err(ValidationError::new(
                Rule::SingleEquals,
                format!(
                    "condition '{}' uses a single '='; comparisons need '=='",
                    condition
                ),
            ));
        }
    }

    Ok(())
}
