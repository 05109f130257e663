//! JSON extraction utilities for cleaning LLM responses

use crate::error::{LLMError, Result};

/// Extracts the pipeline JSON object from LLM output
///
/// This function handles common LLM output patterns:
/// - Markdown code blocks (```json ... ```)
/// - Explanatory text before/after the object
///
/// # Returns
/// * `Ok(Value)` - The parsed JSON object
/// * `Err(LLMError)` - If no JSON object could be parsed
pub fn extract_json(llm_output: &str) -> Result<serde_json::Value> {
    let cleaned = llm_output.trim();

    if cleaned.is_empty() {
        return Err(LLMError::BadReply("Empty response".to_string()));
    }

    if let Some(block) = extract_from_markdown(cleaned) {
        if let Ok(value) = parse_object(&block) {
            return Ok(value);
        }
    }

    if let Some(object) = extract_balanced_object(cleaned) {
        return parse_object(object);
    }

    parse_object(cleaned)
}

/// Extract the body of the first fenced code block
fn extract_from_markdown(content: &str) -> Option<String> {
    if let Some(start) = content.find("```json") {
        let after_start = &content[start + 7..];
        if let Some(end) = after_start.find("```") {
            return Some(after_start[..end].trim().to_string());
        }
    }

    if let Some(start) = content.find("```") {
        let after_start = &content[start + 3..];
        if let Some(end) = after_start.find("```") {
            return Some(after_start[..end].trim().to_string());
        }
    }

    None
}

/// Slice from the first `{` to its matching `}`
fn extract_balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in content[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_object(text: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(text.trim())
        .map_err(|e| LLMError::BadReply(format!("Response is not valid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(LLMError::BadReply(
            "Response is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        let value = extract_json(r#"{"main_workflow": {"name": "MAIN"}}"#).unwrap();
        assert_eq!(value["main_workflow"]["name"], "MAIN");
    }

    #[test]
    fn test_extract_from_markdown() {
        let output = "Here is the pipeline:\n```json\n{\"main_workflow\": {\"name\": \"MAIN\"}}\n```\nDone.";
        let value = extract_json(output).unwrap();
        assert_eq!(value["main_workflow"]["name"], "MAIN");
    }

    #[test]
    fn test_extract_from_prose() {
        let output = r#"Sure. {"globals": [{"name": "ref", "value": "'a}b'"}], "main_workflow": {"name": "MAIN"}} Hope this helps {"#;
        let value = extract_json(output).unwrap();
        assert_eq!(value["globals"][0]["value"], "'a}b'");
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let output = r#"{"main_workflow": {"name": "MAIN", "body": [{"type": "assignment", "variable": "x", "value": "\"}\""}]}}"#;
        let value = extract_json(output).unwrap();
        assert_eq!(value["main_workflow"]["body"][0]["value"], "\"}\"");
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(extract_json("").is_err());
        assert!(extract_json("no object here").is_err());
        assert!(extract_json("[1, 2, 3]").is_err());
        assert!(extract_json("{ \"truncated\": ").is_err());
    }
}
