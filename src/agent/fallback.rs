// ABOUTME: Best-effort scanner for tool calls some models emit as inline
// ABOUTME: pseudo-markup instead of using the structured tool-call channel.

use serde_json::{Map, Value};
use tracing::debug;

const FUNCTION_OPEN: &str = "<function=";
const PARAMETER_OPEN: &str = "<parameter=";
const PARAMETER_CLOSE: &str = "</parameter>";

/// Fallback text when a response is nothing but a broken tool-call fragment.
pub const APOLOGY: &str =
    "I tried to run code but encountered an issue. Please try rephrasing your request.";

/// A tool call recovered from inline markup.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Attempt to parse an inline `<function=name>` call with
/// `<parameter=key>value</parameter>` pairs.
///
/// Any ambiguity is treated as "no tool call": an unterminated tag stops
/// the scan, and a match without a single complete parameter returns None.
pub fn parse_inline_call(content: &str) -> Option<InlineCall> {
    let start = content.find(FUNCTION_OPEN)?;

    let name_start = start + FUNCTION_OPEN.len();
    let name_end = content[name_start..].find('>')?;
    let name = &content[name_start..name_start + name_end];

    let mut arguments = Map::new();
    let mut remaining = &content[name_start + name_end..];

    loop {
        let Some(param_start) = remaining.find(PARAMETER_OPEN) else {
            break;
        };

        let key_start = param_start + PARAMETER_OPEN.len();
        let Some(key_end) = remaining[key_start..].find('>') else {
            break;
        };
        let key = &remaining[key_start..key_start + key_end];

        let value_start = key_start + key_end + 1;
        let Some(value_end) = remaining[value_start..].find(PARAMETER_CLOSE) else {
            break;
        };
        let value = remaining[value_start..value_start + value_end].trim();

        arguments.insert(key.to_string(), Value::String(value.to_string()));
        remaining = &remaining[value_start + value_end + PARAMETER_CLOSE.len()..];
    }

    if arguments.is_empty() {
        return None;
    }

    debug!(tool = name, args = arguments.len(), "parsed inline tool call");

    Some(InlineCall {
        name: name.to_string(),
        arguments,
    })
}

/// Strip dangling tool-call markup from a final response.
///
/// If text precedes the fragment, that prefix is the answer; a response
/// that is pure fragment becomes a neutral apology.
pub fn sanitize_content(content: &str) -> String {
    if let Some(idx) = content.find(FUNCTION_OPEN) {
        if idx > 0 {
            let before = content[..idx].trim();
            if !before.is_empty() {
                return before.to_string();
            }
        }
        return APOLOGY.to_string();
    }

    content.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_parameter() {
        let content = "<function=bash><parameter=command>ls -la</parameter></function>";
        let call = parse_inline_call(content).unwrap();
        assert_eq!(call.name, "bash");
        assert_eq!(call.arguments["command"], "ls -la");
    }

    #[test]
    fn parses_multiple_parameters() {
        let content = "<function=python><parameter=operation>run</parameter>\
                       <parameter=code>print(42)</parameter></function>";
        let call = parse_inline_call(content).unwrap();
        assert_eq!(call.name, "python");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments["operation"], "run");
        assert_eq!(call.arguments["code"], "print(42)");
    }

    #[test]
    fn trims_parameter_values() {
        let content = "<function=bash><parameter=command>\n  pwd\n</parameter></function>";
        let call = parse_inline_call(content).unwrap();
        assert_eq!(call.arguments["command"], "pwd");
    }

    #[test]
    fn no_markup_is_not_a_call() {
        assert!(parse_inline_call("Just a plain answer.").is_none());
    }

    #[test]
    fn unterminated_function_tag_is_not_a_call() {
        assert!(parse_inline_call("<function=bash").is_none());
    }

    #[test]
    fn unterminated_parameter_is_not_a_call() {
        let content = "<function=bash><parameter=command>ls";
        assert!(parse_inline_call(content).is_none());
    }

    #[test]
    fn zero_parameter_match_is_not_a_call() {
        // A tool call with no decoded parameters is ignored rather than
        // dispatched; the content falls through to sanitization.
        let content = "<function=get_current_time></function>";
        assert!(parse_inline_call(content).is_none());
    }

    #[test]
    fn sanitize_keeps_plain_content() {
        assert_eq!(sanitize_content("All done."), "All done.");
    }

    #[test]
    fn sanitize_returns_prefix_before_fragment() {
        let content = "Here is the answer. <function=bash><parameter=command>ls";
        assert_eq!(sanitize_content(content), "Here is the answer.");
    }

    #[test]
    fn sanitize_replaces_pure_fragment() {
        assert_eq!(sanitize_content("<function=bash"), APOLOGY);
    }

    #[test]
    fn sanitize_replaces_whitespace_then_fragment() {
        assert_eq!(sanitize_content("   <function=bash"), APOLOGY);
    }
}
