//! Builtins - Built-in capabilities for Maestro workers
//!
//! This module provides the default capability set:
//! - Search: web_search
//! - File: save_file, read_file, list_files (confined to an output directory)
//! - Exec: execute_code (Python subprocess with timeout)
//! - Data: analyze_data, create_summary

mod code;
mod data;
mod file;
mod web_search;

pub use code::ExecuteCodeTool;
pub use data::{AnalyzeDataTool, CreateSummaryTool};
pub use file::{ListFilesTool, OutputDir, ReadFileTool, SaveFileTool};
pub use web_search::WebSearchTool;

use crate::error::{Error, Result};
use crate::registry::ToolRegistry;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for built-in capabilities
#[derive(Debug, Clone)]
pub struct BuiltinsConfig {
    /// Base directory for file capabilities
    pub output_dir: PathBuf,
    /// Interpreter used by execute_code
    pub python: String,
    /// HTTP timeout for web_search
    pub search_timeout: Duration,
}

impl Default for BuiltinsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            python: "python3".to_string(),
            search_timeout: Duration::from_secs(15),
        }
    }
}

impl BuiltinsConfig {
    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the Python interpreter
    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }
}

/// Register every built-in capability
pub fn register_builtins(registry: &mut ToolRegistry, config: &BuiltinsConfig) -> Result<()> {
    let output = Arc::new(OutputDir::new(&config.output_dir));

    registry.register(Arc::new(WebSearchTool::new(config.search_timeout)?));

    registry.register(Arc::new(SaveFileTool::new(output.clone())));
    registry.register(Arc::new(ReadFileTool::new(output.clone())));
    registry.register(Arc::new(ListFilesTool::new(output)));

    registry.register(Arc::new(ExecuteCodeTool::new(config.python.clone())));

    registry.register(Arc::new(AnalyzeDataTool::new()));
    registry.register(Arc::new(CreateSummaryTool::new()));

    Ok(())
}

/// Fetch a string argument
fn str_arg<'a>(arguments: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidInput(format!("Missing '{}' parameter", name)))
}

/// Fetch an integer argument, falling back to `default`
fn int_arg(arguments: &Map<String, Value>, name: &str, default: i64) -> i64 {
    arguments
        .get(name)
        .and_then(Value::as_i64)
        .unwrap_or(default)
}
