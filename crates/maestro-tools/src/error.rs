//! Errors raised by capabilities.
//!
//! Callers never see these directly: the invoker turns each one into an
//! [`InvocationError`](crate::InvocationError) tagged with a
//! [`FailureKind`](crate::FailureKind), which decides whether it is retried.

use thiserror::Error;

/// Capability error
#[derive(Debug, Error)]
pub enum Error {
    /// A file, directory or capability is missing
    #[error("not found: {0}")]
    NotFound(String),

    /// Arguments were missing or unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Access outside the allowed area, or refused by the OS
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A remote call did not answer in time
    #[error("timed out: {0}")]
    Timeout(String),

    /// A remote call failed at the transport or HTTP level
    #[error("network error: {0}")]
    Network(String),

    /// Anything else; classified by its message
    #[error("execution failed: {0}")]
    Execution(String),

    /// Filesystem or process I/O
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
