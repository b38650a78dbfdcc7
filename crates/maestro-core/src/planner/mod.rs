//! Planner - Task description to execution plan
//!
//! The planner is itself a worker (the `planner` persona, no capabilities)
//! asked to answer with a JSON plan. Plan creation never fails: a reply that
//! cannot be decoded, a plan with no steps, or a model failure all produce
//! [`Plan::fallback`].

mod plan;


pub use plan::{Plan, PlanIssue, Step, FALLBACK_WORKER};

use crate::agent::Worker;
use crate::parser::json_object_span;
use crate::personas::{WorkerSettings, PLANNER};
use maestro_llm::LlmProvider;
use maestro_tools::ToolRegistry;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn planning_prompt(task: &str) -> String {
    format!(
        r#"Create a detailed execution plan for this task:

Task: {task}

Consider:
- What information needs to be gathered?
- What analysis is required?
- What output format is expected?
- Which agents are best suited for each step?

Respond ONLY with the JSON plan structure."#
    )
}

/// Decode a planner reply, falling back on any failure
#[must_use]
pub fn parse_plan(reply: &str, task: &str) -> Plan {
    let Some(span) = json_object_span(reply) else {
        return Plan::fallback(task, "no JSON object found in planner response");
    };

    match serde_json::from_str::<Plan>(span) {
        Ok(plan) if plan.steps.is_empty() => Plan::fallback(task, "plan contains no steps"),
        Ok(plan) => plan,
        Err(e) => Plan::fallback(task, e),
    }
}

/// Turns tasks into plans
pub struct Planner {
    worker: Arc<dyn Worker>,
}

impl Planner {
    /// Planner backed by the built-in planner persona
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &WorkerSettings) -> Self {
        let agent = PLANNER.build(provider, &ToolRegistry::new(), settings);
        Self::with_worker(Arc::new(agent))
    }

    /// Planner delegating to an arbitrary worker
    #[must_use]
    pub fn with_worker(worker: Arc<dyn Worker>) -> Self {
        Self { worker }
    }

    /// Produce a plan for `task`; always returns a usable plan
    #[instrument(skip(self, context), fields(task_len = task.len()))]
    pub async fn create_plan(&self, task: &str, context: &Map<String, Value>) -> Plan {
        let plan = match self.worker.think(&planning_prompt(task), context).await {
            Ok(reply) => parse_plan(&reply.content, task),
            Err(e) => {
                warn!(error = %e, "Planner model call failed");
                Plan::fallback(task, e)
            }
        };

        if plan.is_fallback() {
            warn!(rationale = %plan.rationale, "Using fallback plan");
        } else {
            for issue in plan.validate() {
                warn!(issue = %issue, "Plan issue");
            }
        }

        info!(steps = plan.steps.len(), "Plan created");
        debug!(rationale = %plan.rationale, "Plan rationale");
        plan
    }

    /// Forget the planner's conversation state
    pub async fn reset(&self) {
        self.worker.reset().await;
    }
}
