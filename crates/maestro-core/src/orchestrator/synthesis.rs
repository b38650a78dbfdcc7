//! Synthesis of step outputs into one answer.
//!
//! Successful outputs are taken in ascending step-id order and labeled with
//! the worker recorded in the same result.

use super::types::StepResult;
use crate::personas::worker_title;
use crate::planner::Plan;
use std::collections::BTreeMap;

/// Returned when no step succeeded
pub const TOTAL_FAILURE_MESSAGE: &str =
    "I was unable to complete the task successfully. Please check the execution logs for details.";

/// Combine successful outputs: none gives the failure message, one is
/// returned verbatim, several are joined under per-step headings
#[must_use]
pub fn synthesize(task: &str, plan: &Plan, results: &BTreeMap<u32, StepResult>) -> String {
    let successes: Vec<(u32, &StepResult, &str)> = results
        .iter()
        .filter(|(_, result)| result.is_success())
        .filter_map(|(id, result)| result.output.as_deref().map(|output| (*id, result, output)))
        .collect();

    match successes.as_slice() {
        [] => TOTAL_FAILURE_MESSAGE.to_string(),
        [(_, _, output)] => (*output).to_string(),
        many => {
            let mut combined = format!("# Results for: {}\n\n", task);
            for (id, result, output) in many {
                let worker = result
                    .worker
                    .as_deref()
                    .or_else(|| plan.step(*id).map(|s| s.worker.as_str()))
                    .unwrap_or("unknown");
                combined.push_str(&format!(
                    "## Step {}: {}\n\n{}\n\n",
                    id,
                    worker_title(worker),
                    output
                ));
            }
            combined.trim_end().to_string()
        }
    }
}
