//! Orchestrator - Plan execution and synthesis
//!
//! # Module Structure
//!
//! - `types`: step and run results, execution log
//! - `config`: `OrchestratorConfig` and `ExecutionOrder`
//! - `executor`: dependency-checked, one-at-a-time step execution
//! - `synthesis`: combining successful outputs
//! - `core`: `Orchestrator`, planning plus execution plus memory

mod config;
mod core;
mod executor;
mod synthesis;
mod types;


pub use config::{ExecutionOrder, OrchestratorConfig};
pub use self::core::{Orchestrator, RELEVANT_MEMORIES_KEY};
pub use executor::{dependency_key, schedule, PlanExecutor, Schedule};
pub use synthesis::{synthesize, TOTAL_FAILURE_MESSAGE};
pub use types::{
    ExecutionLogEntry, ExecutionOutcome, RunResult, RunStatus, StepResult, StepStatus,
};
