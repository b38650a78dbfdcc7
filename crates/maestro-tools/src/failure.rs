//! Failure classification for capability invocations
//!
//! Every failed invocation is tagged with a [`FailureKind`] so the caller can
//! decide whether retrying is worthwhile. Only network and timeout failures
//! are retried.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Category of a failed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Connection problems
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// The capability exceeded its time budget
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    /// Access to a resource was refused
    #[serde(rename = "PERMISSION_ERROR")]
    Permission,
    /// Arguments were missing or malformed
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// The capability or a resource it needed does not exist
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// Anything else
    #[serde(rename = "LOGIC_ERROR")]
    Logic,
}

impl FailureKind {
    /// Returns the wire representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::Permission => "PERMISSION_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Logic => "LOGIC_ERROR",
        }
    }

    /// Whether a retry may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }

    /// Classify free-form error text by keyword.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["timeout", "timed out", "connection"]) {
            Self::Network
        } else if has(&["permission", "access"]) {
            Self::Permission
        } else if has(&["argument", "parameter"]) {
            Self::InvalidInput
        } else if has(&["not found", "does not exist"]) {
            Self::NotFound
        } else {
            Self::Logic
        }
    }

    /// Classify a typed tool error, falling back to its message.
    #[must_use]
    pub fn classify(error: &Error) -> Self {
        match error {
            Error::NotFound(_) => Self::NotFound,
            Error::InvalidInput(_) => Self::InvalidInput,
            Error::PermissionDenied(_) => Self::Permission,
            Error::Timeout(_) => Self::Timeout,
            Error::Network(_) => Self::Network,
            Error::Io(io) => match io.kind() {
                std::io::ErrorKind::NotFound => Self::NotFound,
                std::io::ErrorKind::PermissionDenied => Self::Permission,
                std::io::ErrorKind::TimedOut => Self::Timeout,
                std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted => Self::Network,
                _ => Self::from_message(&io.to_string()),
            },
            Error::Execution(message) => Self::from_message(message),
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
