//! Utility modules for maestro-core
//!
//! - retry: exponential backoff for transient capability failures

mod retry;

pub use retry::{retry_with_backoff, Retried, RetryConfig, RetryError};
