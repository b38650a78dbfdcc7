//! Invoker - Capability dispatch
//!
//! This module provides the single entry point workers use to call a
//! capability:
//! - Lookup in the registry
//! - Argument coercion against the declared schema
//! - Timeout handling
//! - Conversion of every failure into a classified [`InvocationError`]
//!
//! The invoker never retries and never returns a Rust error to its caller;
//! failures are values.

use crate::failure::FailureKind;
use crate::registry::ToolRegistry;
use crate::schema::{coerce_arguments, ArgumentError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Configuration for the invoker
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Upper bound for a single capability call
    pub timeout: Duration,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl InvokerConfig {
    /// Set the per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A failed invocation, tagged with its failure category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct InvocationError {
    /// Failure category, drives retry decisions
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
}

impl InvocationError {
    /// Create a new invocation error
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether retrying the call may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Observation form fed back to the model
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message,
            "error_type": self.kind.as_str(),
        })
    }
}

/// Result of one invocation: a JSON value or a classified error
pub type InvocationOutcome = std::result::Result<Value, InvocationError>;

/// Observability record for one capability call, including retries
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRecord {
    /// Capability that was called
    pub capability_name: String,
    /// Arguments as produced by the model
    pub arguments: Map<String, Value>,
    /// Result value or error observation
    pub outcome: Value,
    /// Wall time across all attempts
    pub duration_ms: u64,
    /// Number of attempts made
    pub attempt_count: u32,
}

impl InvocationRecord {
    /// Build a record from an outcome
    #[must_use]
    pub fn new(
        capability_name: impl Into<String>,
        arguments: Map<String, Value>,
        outcome: &InvocationOutcome,
        duration_ms: u64,
        attempt_count: u32,
    ) -> Self {
        Self {
            capability_name: capability_name.into(),
            arguments,
            outcome: outcome_to_json(outcome),
            duration_ms,
            attempt_count,
        }
    }

    /// Whether the call eventually succeeded
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome.get("error").is_none()
    }
}

/// Serialize an outcome into the form the model observes
#[must_use]
pub fn outcome_to_json(outcome: &InvocationOutcome) -> Value {
    match outcome {
        Ok(value) => value.clone(),
        Err(e) => e.to_json(),
    }
}

/// Capability invoker bound to one registry
#[derive(Clone)]
pub struct CapabilityInvoker {
    registry: Arc<ToolRegistry>,
    config: InvokerConfig,
}

impl CapabilityInvoker {
    /// Create a new invoker
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, config: InvokerConfig) -> Self {
        Self { registry, config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, InvokerConfig::default())
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Invoke a capability by name.
    ///
    /// Unknown names, bad arguments, capability errors, timeouts and panics
    /// inside the capability all come back as [`InvocationError`].
    #[instrument(skip(self, arguments), fields(tool = %name))]
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> InvocationOutcome {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = %name, "Unknown capability requested");
            return Err(InvocationError::new(
                FailureKind::NotFound,
                format!("Tool '{}' not found", name),
            ));
        };

        let prepared = coerce_arguments(&tool.definition().parameters, arguments.clone())
            .map_err(|e: ArgumentError| InvocationError::new(FailureKind::InvalidInput, e.to_string()))?;

        let limit = tool.definition().timeout.unwrap_or(self.config.timeout);
        let start = Instant::now();
        debug!(tool = %name, timeout_ms = %limit.as_millis(), "Invoking capability");

        let mut task = tokio::spawn(async move { tool.execute(prepared).await });
        let outcome = match timeout(limit, &mut task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(e))) => Err(InvocationError::new(FailureKind::classify(&e), e.to_string())),
            Ok(Err(join_error)) => Err(InvocationError::new(
                FailureKind::Logic,
                format!("capability aborted: {}", join_error),
            )),
            Err(_) => {
                task.abort();
                Err(InvocationError::new(
                    FailureKind::Timeout,
                    format!("Tool '{}' timed out after {}ms", name, limit.as_millis()),
                ))
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => debug!(tool = %name, duration_ms, "Capability completed"),
            Err(e) => warn!(
                tool = %name,
                duration_ms,
                error_type = %e.kind,
                error = %e.message,
                "Capability failed"
            ),
        }

        outcome
    }
}
