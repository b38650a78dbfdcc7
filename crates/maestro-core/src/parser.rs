//! Parser - Detect capability calls in model output
//!
//! Two grammars are recognized, in priority order:
//!
//! 1. A JSON object spanning the first `{` to the last `}` of the reply,
//!    with a string `tool` field and an object `arguments` field.
//! 2. A call-like line `name(key=value, ...)` covering the whole reply.
//!    This form is best-effort: single level only, no nested parentheses,
//!    values are kept as strings with surrounding quotes removed.
//!
//! Anything else is a final answer. Parsing never fails loudly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

use regex::Regex;

/// Whole-reply `name(key=value, ...)` call
static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*\(([^()]*)\)$")
        .expect("CALL_RE is a compile-time constant")
});

/// Argument key: an identifier
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("KEY_RE is a compile-time constant")
});

/// A capability call extracted from model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Capability name
    #[serde(rename = "tool")]
    pub name: String,
    /// Raw arguments, not yet coerced
    pub arguments: Map<String, Value>,
}

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Accept the `name(key=value)` form
    pub allow_call_syntax: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            allow_call_syntax: true,
        }
    }
}

/// Extracts capability calls from model replies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser {
    config: ParserConfig,
}

impl ResponseParser {
    /// Create a parser with the given configuration
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Only the JSON grammar
    #[must_use]
    pub fn strict() -> Self {
        Self::new(ParserConfig {
            allow_call_syntax: false,
        })
    }

    /// Parse a reply; `None` means the reply is a final answer
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<ToolCall> {
        parse_json_call(text).or_else(|| {
            if self.config.allow_call_syntax {
                parse_call_syntax(text)
            } else {
                None
            }
        })
    }
}

/// Parse with the default configuration
#[must_use]
pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    ResponseParser::default().parse(text)
}

/// The span from the first `{` to the last `}`, if any
#[must_use]
pub fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_json_call(text: &str) -> Option<ToolCall> {
    let span = json_object_span(text)?;
    let mut object = match serde_json::from_str::<Value>(span).ok()? {
        Value::Object(object) => object,
        _ => return None,
    };

    let name = match object.remove("tool")? {
        Value::String(name) if !name.trim().is_empty() => name,
        _ => return None,
    };
    let arguments = match object.remove("arguments")? {
        Value::Object(arguments) => arguments,
        _ => return None,
    };

    Some(ToolCall { name, arguments })
}

fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}

fn parse_call_syntax(text: &str) -> Option<ToolCall> {
    let captures = CALL_RE.captures(text.trim())?;
    let name = captures.get(1)?.as_str().to_string();
    let body = captures.get(2).map_or("", |m| m.as_str()).trim();

    let mut arguments = Map::new();
    if !body.is_empty() {
        for pair in body.split(',') {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if !KEY_RE.is_match(key) {
                return None;
            }
            arguments.insert(key.to_string(), Value::String(strip_quotes(value).to_string()));
        }
    }

    Some(ToolCall { name, arguments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_call() {
        let call = parse_tool_call(r#"{"tool": "web_search", "arguments": {"query": "x"}}"#).unwrap();
        assert_eq!(call.name, "web_search");
        assert_eq!(Value::Object(call.arguments), json!({"query": "x"}));
    }

    #[test]
    fn test_json_call_embedded_in_prose() {
        let text = "Let me look that up.\n{\"tool\": \"web_search\", \"arguments\": {\"query\": \"rust\", \"max_results\": 3}}\nThanks";
        let call = parse_tool_call(text).unwrap();
        assert_eq!(call.arguments["max_results"], json!(3));
    }

    #[test]
    fn test_plain_answer_is_none() {
        assert!(parse_tool_call("I think the answer is 42.").is_none());
        assert!(parse_tool_call("").is_none());
        assert!(parse_tool_call("The result (roughly) is 42.").is_none());
    }

    #[test]
    fn test_json_missing_fields_is_none() {
        assert!(parse_tool_call(r#"{"steps": []}"#).is_none());
        assert!(parse_tool_call(r#"{"tool": "x"}"#).is_none());
        assert!(parse_tool_call(r#"{"tool": "x", "arguments": "q"}"#).is_none());
        assert!(parse_tool_call(r#"{"tool": 3, "arguments": {}}"#).is_none());
        assert!(parse_tool_call("{not json}").is_none());
    }

    #[test]
    fn test_call_syntax() {
        let call = parse_tool_call(r#"web_search(query="rust async", max_results=5)"#).unwrap();
        assert_eq!(call.name, "web_search");
        assert_eq!(call.arguments["query"], json!("rust async"));
        assert_eq!(call.arguments["max_results"], json!("5"));

        let call = parse_tool_call("list_files()").unwrap();
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_call_syntax_fails_soft() {
        assert!(parse_tool_call("f(g(x=1))").is_none());
        assert!(parse_tool_call("search(rust)").is_none());
        assert!(parse_tool_call("not a call(x=1) at all").is_none());
        assert!(parse_tool_call("1bad(x=1)").is_none());
    }

    #[test]
    fn test_strict_parser_ignores_call_syntax() {
        let parser = ResponseParser::strict();
        assert!(parser.parse("web_search(query=x)").is_none());
        assert!(parser
            .parse(r#"{"tool": "web_search", "arguments": {}}"#)
            .is_some());
    }

    #[test]
    fn test_json_object_span() {
        assert_eq!(json_object_span("a {b} c {d} e"), Some("{b} c {d}"));
        assert_eq!(json_object_span("} {"), None);
        assert_eq!(json_object_span("none"), None);
    }
}
