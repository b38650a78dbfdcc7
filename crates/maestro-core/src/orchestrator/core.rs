//! Orchestrator - plan, execute, remember

use super::config::OrchestratorConfig;
use super::executor::PlanExecutor;
use super::types::{ExecutionLogEntry, ExecutionOutcome, RunResult, RunStatus};
use crate::personas::{WorkerRegistry, WorkerSettings};
use crate::planner::{Plan, Planner};
use maestro_llm::LlmProvider;
use maestro_memory::MemoryStore;
use maestro_tools::ToolRegistry;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

/// Context key holding retrieved long-term memories during planning
pub const RELEVANT_MEMORIES_KEY: &str = "relevant_memories";

/// Ties the planner, the executor and an optional long-term store together
pub struct Orchestrator {
    planner: Planner,
    executor: PlanExecutor,
    memory: Option<Arc<dyn MemoryStore>>,
    config: OrchestratorConfig,
    execution_log: Mutex<Vec<ExecutionLogEntry>>,
}

impl Orchestrator {
    /// Create an orchestrator from explicit parts
    #[must_use]
    pub fn new(planner: Planner, workers: WorkerRegistry, config: OrchestratorConfig) -> Self {
        let executor = PlanExecutor::new(workers).with_order(config.execution_order);
        Self {
            planner,
            executor,
            memory: None,
            config,
            execution_log: Mutex::new(Vec::new()),
        }
    }

    /// Planner plus the four standard workers over one model backend
    #[must_use]
    pub fn standard(
        provider: Arc<dyn LlmProvider>,
        tools: &ToolRegistry,
        settings: &WorkerSettings,
        config: OrchestratorConfig,
    ) -> Self {
        let planner = Planner::new(provider.clone(), settings);
        let workers = WorkerRegistry::standard(provider, tools, settings);
        Self::new(planner, workers, config)
    }

    /// Attach a long-term memory store
    #[must_use]
    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Settings
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Registered workers
    #[must_use]
    pub fn workers(&self) -> &WorkerRegistry {
        self.executor.workers()
    }

    /// Produce a plan without executing it
    pub async fn plan(&self, task: &str, context: &Map<String, Value>) -> Plan {
        self.planner.create_plan(task, context).await
    }

    /// Execute an existing plan
    pub async fn execute(
        &self,
        task: &str,
        plan: &Plan,
        context: &Map<String, Value>,
    ) -> ExecutionOutcome {
        let outcome = self.executor.execute(task, plan, context).await;
        self.execution_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(outcome.log.iter().cloned());
        outcome
    }

    /// Plan and execute `task`; a run always completes with a result
    #[instrument(skip(self, context), fields(task_len = task.len()))]
    pub async fn process_task(&self, task: &str, context: &Map<String, Value>) -> RunResult {
        info!("Processing task");

        let mut planning_context = context.clone();
        if let Some(memories) = self.recall(task).await {
            planning_context.insert(RELEVANT_MEMORIES_KEY.to_string(), memories);
        }

        let plan = self.plan(task, &planning_context).await;
        let outcome = self.execute(task, &plan, context).await;
        let result = RunResult::new(task, plan, outcome);

        self.remember(&result).await;
        info!(status = result.status.as_str(), "Task processed");
        result
    }

    async fn recall(&self, task: &str) -> Option<Value> {
        let memory = self.memory.as_ref()?;
        if self.config.memory_top_k == 0 {
            return None;
        }

        match memory.retrieve(task, self.config.memory_top_k).await {
            Ok(records) if records.is_empty() => None,
            Ok(records) => Some(Value::Array(
                records.into_iter().map(|r| Value::String(r.content)).collect(),
            )),
            Err(e) => {
                warn!(error = %e, "Memory retrieval failed, planning without it");
                None
            }
        }
    }

    async fn remember(&self, result: &RunResult) {
        let Some(memory) = self.memory.as_ref() else {
            return;
        };
        if !self.config.remember_results || result.status == RunStatus::Failed {
            return;
        }

        let content = format!("Task: {}\nResult: {}", result.query, result.final_output);
        let mut metadata = Map::new();
        metadata.insert("query".into(), json!(result.query));
        metadata.insert("status".into(), json!(result.status.as_str()));
        metadata.insert("steps".into(), json!(result.plan.steps.len()));

        if let Err(e) = memory.store(&content, metadata).await {
            warn!(error = %e, "Failed to store run in long-term memory");
        }
    }

    /// Steps processed since the last reset, oldest first
    #[must_use]
    pub fn execution_log(&self) -> Vec<ExecutionLogEntry> {
        self.execution_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Reset the planner, every worker, and the execution log
    pub async fn reset(&self) {
        self.planner.reset().await;
        for worker in self.executor.workers().iter() {
            worker.reset().await;
        }
        self.execution_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        info!("Orchestrator reset");
    }
}
