//! Error types for the memory stores.

/// Errors that can occur in memory operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem error while loading or persisting
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization / deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
