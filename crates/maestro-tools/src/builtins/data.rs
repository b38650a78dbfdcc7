//! Data tools - Lightweight structural analysis and word-based summaries

use super::{int_arg, str_arg};
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition};
use crate::schema::{ParamSpec, ParamType};
use serde_json::{json, Map, Value};

const SAMPLE_SIZE: usize = 3;

/// JSON type name of a value
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Describe the shape of `data` and compute numeric statistics for arrays
fn analyze(data: &Value, analysis_type: &str) -> Value {
    let mut results = Map::new();
    results.insert("analysis_type".into(), json!(analysis_type));
    results.insert("data_type".into(), json!(type_name(data)));

    match data {
        Value::Array(items) => {
            results.insert("count".into(), json!(items.len()));
            results.insert(
                "sample".into(),
                Value::Array(items.iter().take(SAMPLE_SIZE).cloned().collect()),
            );

            let numbers: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if !numbers.is_empty() {
                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                results.insert(
                    "numeric_stats".into(),
                    json!({"min": min, "max": max, "mean": mean, "count": numbers.len()}),
                );
            }
        }
        Value::Object(map) => {
            let keys: Vec<&String> = map.keys().collect();
            results.insert("keys".into(), json!(keys));
            results.insert("key_count".into(), json!(map.len()));
            let sample: Map<String, Value> = map
                .iter()
                .take(SAMPLE_SIZE)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            results.insert("sample".into(), Value::Object(sample));
        }
        _ => {}
    }

    results.insert("status".into(), json!("success"));
    Value::Object(results)
}

/// Tool that reports structure and statistics of JSON data
pub struct AnalyzeDataTool {
    definition: ToolDefinition,
}

impl AnalyzeDataTool {
    /// Create a new analysis tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "analyze_data",
            "Analyze structured data (object, array or JSON text)",
        )
        .with_category(ToolCategory::Data)
        .with_param(ParamSpec::required("data", ParamType::Any, "Data to analyze"))
        .with_param(ParamSpec::optional(
            "analysis_type",
            ParamType::String,
            "summary, trend or comparison",
            json!("summary"),
        ));

        Self { definition }
    }
}

impl Default for AnalyzeDataTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for AnalyzeDataTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let data = arguments
            .get("data")
            .ok_or_else(|| Error::InvalidInput("Missing 'data' parameter".to_string()))?;
        let analysis_type = arguments
            .get("analysis_type")
            .and_then(Value::as_str)
            .unwrap_or("summary");

        let parsed;
        let data = match data {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text).map_err(|e| {
                    Error::InvalidInput(format!("data argument is not valid JSON: {}", e))
                })?;
                &parsed
            }
            other => other,
        };

        Ok(analyze(data, analysis_type))
    }
}

/// Tool that truncates text to a word budget
pub struct CreateSummaryTool {
    definition: ToolDefinition,
}

impl CreateSummaryTool {
    /// Create a new summary tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("create_summary", "Summarize text content")
            .with_category(ToolCategory::Data)
            .with_param(ParamSpec::required(
                "content",
                ParamType::String,
                "Text to summarize",
            ))
            .with_param(ParamSpec::optional(
                "max_length",
                ParamType::Integer,
                "Maximum length in words",
                json!(200),
            ));

        Self { definition }
    }
}

impl Default for CreateSummaryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CreateSummaryTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let content = str_arg(&arguments, "content")?;
        let max_length = int_arg(&arguments, "max_length", 200).max(1) as usize;

        let words: Vec<&str> = content.split_whitespace().collect();
        let summary = if words.len() <= max_length {
            content.to_string()
        } else {
            format!("{}...", words[..max_length].join(" "))
        };

        Ok(json!({
            "status": "success",
            "original_length": words.len(),
            "summary_length": summary.split_whitespace().count(),
            "summary": summary,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_analyze_numeric_list() {
        let tool = AnalyzeDataTool::new();
        let result = tool
            .execute(args(json!({"data": [4, 1, 7, "x"]})))
            .await
            .unwrap();

        assert_eq!(result["data_type"], "array");
        assert_eq!(result["count"], 4);
        assert_eq!(result["sample"], json!([4, 1, 7]));
        assert_eq!(result["numeric_stats"]["min"], 1.0);
        assert_eq!(result["numeric_stats"]["max"], 7.0);
        assert_eq!(result["numeric_stats"]["mean"], 4.0);
        assert_eq!(result["numeric_stats"]["count"], 3);
    }

    #[tokio::test]
    async fn test_analyze_json_text_object() {
        let tool = AnalyzeDataTool::new();
        let result = tool
            .execute(args(json!({"data": "{\"a\": 1, \"b\": 2}", "analysis_type": "trend"})))
            .await
            .unwrap();

        assert_eq!(result["analysis_type"], "trend");
        assert_eq!(result["data_type"], "object");
        assert_eq!(result["key_count"], 2);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_json_text() {
        let tool = AnalyzeDataTool::new();
        let err = tool
            .execute(args(json!({"data": "not json"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_summary_truncates_words() {
        let tool = CreateSummaryTool::new();
        let result = tool
            .execute(args(json!({"content": "one two three four five", "max_length": 3})))
            .await
            .unwrap();
        assert_eq!(result["summary"], "one two three...");
        assert_eq!(result["original_length"], 5);

        let short = tool
            .execute(args(json!({"content": "short text", "max_length": 10})))
            .await
            .unwrap();
        assert_eq!(short["summary"], "short text");
    }
}
