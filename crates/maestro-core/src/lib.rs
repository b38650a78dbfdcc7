//! Maestro Core - Multi-agent orchestration engine
//!
//! This crate provides:
//! - Parser: detecting capability calls in model output
//! - Agent: the bounded think/act/observe reasoning loop run by every worker
//! - Personas: built-in researcher, analyst, writer, coder and planner presets
//! - Planner: task description to dependency-annotated plan, with fallback
//! - Orchestrator: dependency-checked plan execution and result synthesis
//! - Utils: retry with exponential backoff

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod personas;
pub mod planner;
pub mod utils;

pub use agent::{
    Agent, AgentConfig, AgentReply, ContextUsage, ConversationHistory, ConversationTurn, Critique,
    SessionSummary, TurnLog, Worker, ITERATION_LIMIT_MESSAGE,
};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use orchestrator::{
    ExecutionLogEntry, ExecutionOrder, ExecutionOutcome, Orchestrator, OrchestratorConfig,
    PlanExecutor, RunResult, RunStatus, StepResult, StepStatus,
};
pub use parser::{parse_tool_call, ParserConfig, ResponseParser, ToolCall};
pub use personas::{persona, Persona, WorkerRegistry, WorkerSettings};
pub use planner::{Plan, PlanIssue, Planner, Step};
pub use utils::{retry_with_backoff, RetryConfig};
