//! Error types for maestro-core
//!
//! This module provides the core error type and user-facing formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A plan step named a worker that is not registered
    #[error("Unknown agent: {0}")]
    UnknownWorker(String),

    /// Planning failed
    #[error("planning error: {0}")]
    Planning(String),

    /// Execution failed
    #[error("execution error: {0}")]
    Execution(String),

    /// Invalid settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Model backend error
    #[error("llm error: {0}")]
    Llm(#[from] maestro_llm::Error),

    /// Capability error
    #[error("tool error: {0}")]
    Tool(#[from] maestro_tools::Error),

    /// Memory store error
    #[error("memory error: {0}")]
    Memory(#[from] maestro_memory::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::UnknownWorker(name) => format!("Unknown worker '{}'.", name),
            Error::Planning(msg) => format!("Planning failed: {}", msg),
            Error::Execution(msg) => format!("Execution failed: {}", msg),
            Error::Configuration(msg) => format!("Configuration error: {}", msg),
            Error::Llm(e) if e.is_unreachable() => {
                "The language model backend is unreachable.".to_string()
            }
            Error::Llm(e) => format!("Language model error: {}", e),
            Error::Tool(e) => format!("Tool error: {}", e),
            Error::Memory(e) => format!("Memory error: {}", e),
            Error::Serialization(e) => format!("Serialization error: {}", e),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::UnknownWorker(_) => Some(
                "Known workers are researcher, analyst, writer and coder.".to_string(),
            ),
            Error::Llm(e) if e.is_unreachable() => Some(
                "Check that Ollama is running and that llm.base_url points at it.".to_string(),
            ),
            Error::Configuration(_) => {
                Some("Check config/default.toml, config/local.toml or MAESTRO_* variables.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_worker_message() {
        let error = Error::UnknownWorker("poet".to_string());
        assert_eq!(error.to_string(), "Unknown agent: poet");
        assert!(error.suggestion().unwrap().contains("researcher"));
    }

    #[test]
    fn test_unreachable_backend_suggestion() {
        let error = Error::from(maestro_llm::Error::Network("connection refused".to_string()));
        let formatted = format_error_for_cli(&error);
        assert!(formatted.contains("unreachable"));
        assert!(formatted.contains("Ollama"));
    }
}
