//! The worker seam the executor dispatches steps through.

use super::critique::Critique;
use crate::error::Result;
use maestro_tools::InvocationRecord;
use serde::Serialize;
use serde_json::{Map, Value};

/// Final answer of one `think` call
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentReply {
    /// Text returned to the caller
    pub content: String,
    /// Capabilities invoked, in call order
    pub capabilities_used: Vec<String>,
    /// Model calls made
    pub iterations: usize,
    /// Tokens reported by the backend across all calls
    pub tokens: u32,
    /// The loop ran out of iterations before a final answer
    pub limit_reached: bool,
    /// One record per capability call
    pub invocations: Vec<InvocationRecord>,
    /// Verdicts on each call, when reflection is enabled
    pub critiques: Vec<Critique>,
}

impl AgentReply {
    /// A reply carrying only text
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// A named reasoning unit that answers one message at a time
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Worker: Send + Sync {
    /// Registry name (lowercase, e.g. `researcher`)
    fn name(&self) -> &str;

    /// Answer `message`; an empty `context` means none is attached
    async fn think(&self, message: &str, context: &Map<String, Value>) -> Result<AgentReply>;

    /// Forget conversation state
    async fn reset(&self);
}
