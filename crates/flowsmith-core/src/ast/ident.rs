//! Identifier and expression-shape helpers shared by construction,
//! validation and rendering

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

static DOTTED_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
});

static FUNCTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\(.*\)$").expect("valid regex"));

static LEADING_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("valid regex"));

static EMIT_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("valid regex"));

/// Allow-listed channel factories
pub const CHANNEL_FACTORIES: &[&str] = &[
    "Channel.fromPath",
    "Channel.fromFilePairs",
    "Channel.of",
    "Channel.value",
    "Channel.fromSRA",
    "Channel.empty",
    "Channel.fromList",
    "Channel.topic",
];

/// Roots that resolve without being declared
pub const IMPLICIT_ROOTS: &[&str] = &[
    "params",
    "Channel",
    "channel",
    "workflow",
    "file",
    "files",
    "log",
    "projectDir",
    "baseDir",
    "launchDir",
    "it",
    "true",
    "false",
    "null",
    "nextflow",
];

/// Prefix reserved for imported standard tools
pub const STANDARD_TOOL_PREFIX: &str = "step_";

/// Module path prefix of the tool namespace
pub const TOOL_NAMESPACE: &str = "../steps/";

/// Module path prefix of the helper namespace
pub const HELPER_NAMESPACE: &str = "../functions/";

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

pub fn is_dotted_path(text: &str) -> bool {
    DOTTED_PATH.is_match(text)
}

/// `name(...)` with a bare identifier callee
pub fn is_function_call(text: &str) -> bool {
    FUNCTION_CALL.is_match(text)
}

/// Whether the expression addresses the `Channel` namespace at all
pub fn is_channel_factory_expr(text: &str) -> bool {
    text.starts_with("Channel.")
}

/// `Channel.<factory>` or `Channel.<factory>(...)` with an allow-listed factory
pub fn is_channel_factory_call(text: &str) -> bool {
    let factory = text.split('(').next().unwrap_or_default().trim();
    let shaped = !text.contains('(') || text.ends_with(')');
    shaped && CHANNEL_FACTORIES.contains(&factory)
}

/// Dotted source path accepted for emit internals
pub fn is_emit_source(text: &str) -> bool {
    EMIT_SOURCE.is_match(text) && !text.ends_with('.') && !text.contains("..")
}

pub fn is_implicit_root(name: &str) -> bool {
    IMPLICIT_ROOTS.contains(&name)
}

/// First identifier of an expression, after prefix operators and opening
/// parentheses
pub fn leading_identifier(text: &str) -> Option<&str> {
    let text = text.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '(' | '!' | '-' | '+' | '~')
    });
    LEADING_IDENTIFIER.find(text).map(|m| m.as_str())
}

/// Whole-text literal: a single quoted string, a number, a boolean or
/// `null`, a list or map, or a closure
pub fn is_literal(text: &str) -> bool {
    let text = text.trim();

    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return !text[1..text.len() - 1].contains(quote);
        }
    }

    if matches!(text, "true" | "false" | "null") {
        return true;
    }
    if text.parse::<f64>().is_ok() && text.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    (text.starts_with('[') && text.ends_with(']'))
        || (text.starts_with('{') && text.ends_with('}'))
}

/// Python-style `isupper`: at least one cased char and no lower-case ones
pub fn is_all_uppercase(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("reads_ch"));
        assert!(is_identifier("_tmp"));
        assert!(!is_identifier("2reads"));
        assert!(!is_identifier("ALIGN.out"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_start_shapes() {
        assert!(is_dotted_path("ALIGN.out.bam"));
        assert!(!is_dotted_path("ALIGN.out."));
        assert!(is_function_call("get_samples(params.input)"));
        assert!(!is_function_call("a.b(c)"));
        assert!(is_channel_factory_call("Channel.fromPath(params.reads)"));
        assert!(is_channel_factory_call("Channel.empty()"));
        assert!(!is_channel_factory_call("Channel.watchPath(x)"));
        assert!(is_channel_factory_expr("Channel.watchPath(x)"));
    }

    #[test]
    fn test_leading_identifier() {
        assert_eq!(leading_identifier("ALIGN.out.bam"), Some("ALIGN"));
        assert_eq!(leading_identifier("merge(a, b)"), Some("merge"));
        assert_eq!(leading_identifier("  reads  "), Some("reads"));
        assert_eq!(leading_identifier("ghost[0]"), Some("ghost"));
        assert_eq!(leading_identifier("ghost + 1"), Some("ghost"));
        assert_eq!(leading_identifier("(!ghost)"), Some("ghost"));
        assert_eq!(leading_identifier("'literal'"), None);
    }

    #[test]
    fn test_literals() {
        assert!(is_literal("'hg38'"));
        assert!(is_literal("\"a b\""));
        assert!(is_literal("42"));
        assert!(is_literal("-0.5"));
        assert!(is_literal("true"));
        assert!(is_literal("[1, 2]"));
        assert!(is_literal("[:]"));
        assert!(is_literal("{ it * 2 }"));
        assert!(!is_literal("'a' + ghost + 'b'"));
        assert!(!is_literal("ghost[0]"));
        assert!(!is_literal("[1] + ghost"));
        assert!(!is_literal("nan"));
        assert!(!is_literal(""));
    }

    #[test]
    fn test_uppercase() {
        assert!(is_all_uppercase("FASTQC"));
        assert!(is_all_uppercase("FASTQC_2"));
        assert!(!is_all_uppercase("FastQC"));
        assert!(!is_all_uppercase("___"));
    }
}
