//! Maestro Memory - Context stores for workers and the orchestrator
//!
//! Two stores, both deliberately simple:
//! - [`ShortTermMemory`]: an in-process sliding window of role-tagged messages
//! - [`LongTermMemory`]: a JSON-file store with keyword-overlap retrieval
//!
//! The orchestrator talks to long-term memory through the [`MemoryStore`]
//! trait so tests and alternative backends can be swapped in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod long_term;
pub mod short_term;

pub use error::{Error, Result};
pub use long_term::{LongTermMemory, MemoryRecord, MemoryStats, MemoryStore};
pub use short_term::{MemoryMessage, ShortTermMemory};
