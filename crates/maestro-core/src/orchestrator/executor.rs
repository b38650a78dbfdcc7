//! Plan executor
//!
//! Steps run one at a time. Before a step runs, every dependency must have a
//! recorded, successful result; otherwise the step is recorded `failed` and
//! skipped. A worker error is recorded as that step's `error` and execution
//! moves on. Every declared step id receives exactly one result.

use super::config::ExecutionOrder;
use super::synthesis::synthesize;
use super::types::{ExecutionLogEntry, ExecutionOutcome, RunStatus, StepResult};
use crate::error::Error;
use crate::personas::WorkerRegistry;
use crate::planner::{Plan, Step};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Context key under which a dependency's output is passed on
#[must_use]
pub fn dependency_key(step_id: u32) -> String {
    format!("step_{}_result", step_id)
}

/// Steps in the order they will be processed, plus those that cannot be
/// scheduled (with the reason), by index into `plan.steps`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Runnable order
    pub order: Vec<usize>,
    /// Unschedulable steps and why
    pub blocked: Vec<(usize, String)>,
}

/// Compute the processing order for `plan`
#[must_use]
pub fn schedule(plan: &Plan, order: ExecutionOrder) -> Schedule {
    match order {
        ExecutionOrder::ListOrder => Schedule {
            order: (0..plan.steps.len()).collect(),
            blocked: Vec::new(),
        },
        ExecutionOrder::Topological => topological_schedule(plan),
    }
}

/// Kahn's algorithm over step indices, releasing ready steps by list
/// position. Dependencies on ids absent from the plan are left for the
/// runtime check, which records them as not met.
fn topological_schedule(plan: &Plan) -> Schedule {
    let mut index_of: HashMap<u32, usize> = HashMap::new();
    for (index, step) in plan.steps.iter().enumerate() {
        index_of.entry(step.id).or_insert(index);
    }

    let n = plan.steps.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (index, step) in plan.steps.iter().enumerate() {
        let unique: BTreeSet<u32> = step.dependencies.iter().copied().collect();
        for dependency in unique {
            if let Some(&parent) = index_of.get(&dependency) {
                in_degree[index] += 1;
                dependents[parent].push(index);
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(index) = ready.pop_first() {
        order.push(index);
        for &child in &dependents[index] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.insert(child);
            }
        }
    }

    let blocked = (0..n)
        .filter(|&i| in_degree[i] > 0)
        .map(|i| (i, "dependency cycle".to_string()))
        .collect();

    Schedule { order, blocked }
}

/// Why a step cannot start given the results so far
fn unmet_dependency(step: &Step, results: &BTreeMap<u32, StepResult>) -> Option<String> {
    step.dependencies.iter().find_map(|dependency| match results.get(dependency) {
        None => Some(format!("Dependency {} not met", dependency)),
        Some(result) if !result.is_success() => {
            Some(format!("dependency {} did not succeed", dependency))
        }
        Some(_) => None,
    })
}

fn record(
    step: &Step,
    result: StepResult,
    started: Instant,
    results: &mut BTreeMap<u32, StepResult>,
    log: &mut Vec<ExecutionLogEntry>,
) {
    if results.contains_key(&step.id) {
        warn!(step = step.id, "Duplicate step id, keeping the first result");
        return;
    }

    log.push(ExecutionLogEntry {
        step_id: step.id,
        worker: step.worker.clone(),
        action: step.action.clone(),
        status: result.status,
        duration_ms: started.elapsed().as_millis() as u64,
        timestamp: Utc::now(),
    });
    results.insert(step.id, result);
}

/// Runs plans against a set of workers
#[derive(Debug, Clone)]
pub struct PlanExecutor {
    workers: WorkerRegistry,
    order: ExecutionOrder,
}

impl PlanExecutor {
    /// Create an executor using list order
    #[must_use]
    pub fn new(workers: WorkerRegistry) -> Self {
        Self {
            workers,
            order: ExecutionOrder::default(),
        }
    }

    /// Set the ordering strategy
    #[must_use]
    pub fn with_order(mut self, order: ExecutionOrder) -> Self {
        self.order = order;
        self
    }

    /// Registered workers
    #[must_use]
    pub fn workers(&self) -> &WorkerRegistry {
        &self.workers
    }

    /// Execute `plan` and synthesize the final answer
    #[instrument(skip(self, task, plan, context), fields(task = %task, steps = plan.steps.len()))]
    pub async fn execute(
        &self,
        task: &str,
        plan: &Plan,
        context: &Map<String, Value>,
    ) -> ExecutionOutcome {
        let schedule = schedule(plan, self.order);
        let mut results: BTreeMap<u32, StepResult> = BTreeMap::new();
        let mut log = Vec::with_capacity(plan.steps.len());

        for (index, reason) in &schedule.blocked {
            let step = &plan.steps[*index];
            warn!(step = step.id, reason = %reason, "Step cannot be scheduled");
            let result = StepResult::failed(reason.clone(), Some(step.worker.clone()));
            record(step, result, Instant::now(), &mut results, &mut log);
        }

        for &index in &schedule.order {
            let step = &plan.steps[index];
            if results.contains_key(&step.id) {
                warn!(step = step.id, worker = %step.worker, "Duplicate step id, not running it");
                continue;
            }
            let started = Instant::now();
            let result = self.run_step(step, context, &results).await;
            record(step, result, started, &mut results, &mut log);
        }

        let final_output = synthesize(task, plan, &results);
        let status = RunStatus::from_results(&results);
        info!(status = status.as_str(), "Plan executed");

        ExecutionOutcome {
            status,
            results,
            final_output,
            log,
        }
    }

    async fn run_step(
        &self,
        step: &Step,
        context: &Map<String, Value>,
        results: &BTreeMap<u32, StepResult>,
    ) -> StepResult {
        if let Some(reason) = unmet_dependency(step, results) {
            warn!(step = step.id, reason = %reason, "Skipping step");
            return StepResult::failed(reason, Some(step.worker.clone()));
        }

        let Some(worker) = self.workers.get(&step.worker) else {
            let error = Error::UnknownWorker(step.worker.clone());
            warn!(step = step.id, error = %error, "Skipping step");
            return StepResult::failed(error.to_string(), Some(step.worker.clone()));
        };

        let mut step_context = context.clone();
        for dependency in &step.dependencies {
            if let Some(output) = results.get(dependency).and_then(|r| r.output.clone()) {
                step_context.insert(dependency_key(*dependency), Value::String(output));
            }
        }

        info!(step = step.id, worker = %step.worker, "Executing step");
        match worker.think(&step.action, &step_context).await {
            Ok(reply) => {
                debug!(
                    step = step.id,
                    iterations = reply.iterations,
                    tokens = reply.tokens,
                    "Step completed"
                );
                StepResult::success(reply.content, step.worker.clone())
            }
            Err(e) => {
                warn!(step = step.id, error = %e, "Step errored");
                StepResult::error(e.to_string(), step.worker.clone())
            }
        }
    }
}
