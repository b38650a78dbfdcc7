//! Orchestrator types
//!
//! - `StepStatus` and `StepResult` for per-step outcomes
//! - `RunStatus`, `ExecutionOutcome` and `RunResult` for whole runs
//! - `ExecutionLogEntry` for the execution log

use crate::planner::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of one executed (or skipped) step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// The worker returned an answer
    Success,
    /// The step was not run (dependency or worker problem)
    Failed,
    /// The worker ran and returned an error
    Error,
}

impl StepStatus {
    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::Error => "error",
        }
    }
}

/// Outcome of one step, recorded exactly once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Outcome category
    pub status: StepStatus,
    /// Worker answer, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Failure description, otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Worker the step was assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
}

impl StepResult {
    /// A successful step
    #[must_use]
    pub fn success(output: impl Into<String>, worker: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Success,
            output: Some(output.into()),
            error: None,
            worker: Some(worker.into()),
        }
    }

    /// A step that was not run
    #[must_use]
    pub fn failed(error: impl Into<String>, worker: Option<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            output: None,
            error: Some(error.into()),
            worker,
        }
    }

    /// A step whose worker returned an error
    #[must_use]
    pub fn error(error: impl Into<String>, worker: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Error,
            output: None,
            error: Some(error.into()),
            worker: Some(worker.into()),
        }
    }

    /// Whether the step succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every step succeeded
    Success,
    /// Some, but not all, steps succeeded
    PartialSuccess,
    /// No step succeeded, or the plan was empty
    Failed,
}

impl RunStatus {
    /// Derive the run status from step results
    #[must_use]
    pub fn from_results(results: &BTreeMap<u32, StepResult>) -> Self {
        let succeeded = results.values().filter(|r| r.is_success()).count();
        if succeeded == 0 {
            RunStatus::Failed
        } else if succeeded == results.len() {
            RunStatus::Success
        } else {
            RunStatus::PartialSuccess
        }
    }

    /// snake_case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial_success",
            RunStatus::Failed => "failed",
        }
    }
}

/// One line of the execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// Step id
    pub step_id: u32,
    /// Assigned worker
    pub worker: String,
    /// Step instruction
    pub action: String,
    /// Recorded status
    pub status: StepStatus,
    /// Time spent on the step
    pub duration_ms: u64,
    /// When the step finished
    pub timestamp: DateTime<Utc>,
}

/// Result of executing a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Overall status
    pub status: RunStatus,
    /// Per-step results keyed by step id
    pub results: BTreeMap<u32, StepResult>,
    /// Synthesized answer
    pub final_output: String,
    /// Steps in the order they were processed
    pub log: Vec<ExecutionLogEntry>,
}

/// Result of planning and executing a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Overall status
    pub status: RunStatus,
    /// The task as given
    pub query: String,
    /// Plan that was executed
    pub plan: Plan,
    /// Per-step results keyed by step id
    pub results: BTreeMap<u32, StepResult>,
    /// Synthesized answer
    pub final_output: String,
    /// Steps in the order they were processed
    pub log: Vec<ExecutionLogEntry>,
}

impl RunResult {
    /// Combine a plan with its execution outcome
    #[must_use]
    pub fn new(query: impl Into<String>, plan: Plan, outcome: ExecutionOutcome) -> Self {
        Self {
            status: outcome.status,
            query: query.into(),
            plan,
            results: outcome.results,
            final_output: outcome.final_output,
            log: outcome.log,
        }
    }
}
