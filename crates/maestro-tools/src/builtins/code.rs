//! Code tool - Python execution in a subprocess
//!
//! The only isolation is the process boundary and a wall-clock timeout.

use super::{int_arg, str_arg};
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition};
use crate::schema::{ParamSpec, ParamType};
use serde_json::{json, Map, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const MAX_TIMEOUT_SECS: i64 = 300;

/// Slack between the script deadline and the invoker's outer bound
const OUTER_GRACE_SECS: u64 = 5;

/// Tool that runs Python source and captures its output
pub struct ExecuteCodeTool {
    definition: ToolDefinition,
    python: String,
}

impl ExecuteCodeTool {
    /// Create a new code tool using the given interpreter
    #[must_use]
    pub fn new(python: impl Into<String>) -> Self {
        let definition = ToolDefinition::new(
            "execute_code",
            "Execute code and return its output (only Python is supported)",
        )
        .with_category(ToolCategory::Exec)
        .with_timeout(Duration::from_secs(MAX_TIMEOUT_SECS as u64 + OUTER_GRACE_SECS))
        .with_param(ParamSpec::required(
            "code",
            ParamType::String,
            "Source code to execute",
        ))
        .with_param(ParamSpec::optional(
            "language",
            ParamType::String,
            "Programming language",
            json!("python"),
        ))
        .with_param(ParamSpec::optional(
            "timeout",
            ParamType::Integer,
            "Maximum execution time in seconds",
            json!(30),
        ));

        Self {
            definition,
            python: python.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for ExecuteCodeTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let code = str_arg(&arguments, "code")?;
        let language = arguments
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or("python");

        if !matches!(language.to_lowercase().as_str(), "python" | "python3") {
            return Err(Error::InvalidInput(format!(
                "Unsupported language: {}. Only Python is currently supported.",
                language
            )));
        }

        let timeout_secs = int_arg(&arguments, "timeout", 30).clamp(1, MAX_TIMEOUT_SECS);

        let mut child = Command::new(&self.python)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Execution(format!("Failed to start {}: {}", self.python, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        debug!(bytes = code.len(), timeout_secs, "Running Python code");

        let waited = tokio::time::timeout(
            Duration::from_secs(timeout_secs as u64),
            child.wait_with_output(),
        )
        .await;

        let output = match waited {
            Ok(output) => output?,
            Err(_) => {
                warn!(timeout_secs, "Code execution timed out");
                return Ok(json!({
                    "status": "error",
                    "output": null,
                    "error": format!("Execution timed out after {} seconds", timeout_secs),
                    "exitcode": -1,
                }));
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();

        Ok(json!({
            "status": if success { "success" } else { "error" },
            "output": String::from_utf8_lossy(&output.stdout),
            "error": if success {
                None
            } else {
                Some(String::from_utf8_lossy(&output.stderr).into_owned())
            },
            "exitcode": exit_code,
        }))
    }
}
