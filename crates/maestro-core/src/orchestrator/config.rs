//! Orchestrator configuration

use serde::{Deserialize, Serialize};

/// How plan steps are ordered for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrder {
    /// Plan list order; a dependency listed later than its dependent fails it
    #[default]
    ListOrder,
    /// Dependencies first, ties broken by list position; cycles fail
    Topological,
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Step ordering strategy
    #[serde(default)]
    pub execution_order: ExecutionOrder,
    /// Append `Task/Result` records to long-term memory after a run
    #[serde(default = "default_true")]
    pub remember_results: bool,
    /// Memories retrieved into the planning context
    #[serde(default = "default_top_k")]
    pub memory_top_k: usize,
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    3
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            execution_order: ExecutionOrder::default(),
            remember_results: true,
            memory_top_k: default_top_k(),
        }
    }
}

impl OrchestratorConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution order
    #[must_use]
    pub fn with_execution_order(mut self, order: ExecutionOrder) -> Self {
        self.execution_order = order;
        self
    }

    /// Enable or disable writing results to long-term memory
    #[must_use]
    pub fn with_remember_results(mut self, remember: bool) -> Self {
        self.remember_results = remember;
        self
    }

    /// Set how many memories are retrieved for planning
    #[must_use]
    pub fn with_memory_top_k(mut self, top_k: usize) -> Self {
        self.memory_top_k = top_k;
        self
    }
}
