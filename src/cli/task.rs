//! `run`, `plan` and `ask`

use crate::runtime::Runtime;
use anyhow::{bail, Context, Result};
use maestro_core::{format_error_for_cli, RunStatus, StepStatus};
use serde_json::{Map, Value};

pub async fn run(runtime: &Runtime, task: &str, context: &Map<String, Value>, json: bool) -> Result<()> {
    let orchestrator = runtime.orchestrator();
    let result = orchestrator.process_task(task, context).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize run result")?
        );
    } else {
        println!("📋 Plan: {}", result.plan.rationale);
        for step in &result.plan.steps {
            let status = result
                .results
                .get(&step.id)
                .map_or("missing", |r| r.status.as_str());
            let marker = match result.results.get(&step.id).map(|r| r.status) {
                Some(StepStatus::Success) => "✅",
                _ => "❌",
            };
            println!("  {} [{}] {}: {} ({})", marker, step.id, step.worker, step.action, status);
            if let Some(error) = result.results.get(&step.id).and_then(|r| r.error.as_deref()) {
                println!("      {}", error);
            }
        }
        println!("\n{}", result.final_output);
    }

    if result.status == RunStatus::Failed {
        bail!("No step succeeded");
    }
    Ok(())
}

pub async fn plan(runtime: &Runtime, task: &str) -> Result<()> {
    let orchestrator = runtime.orchestrator();
    let plan = orchestrator.plan(task, &Map::new()).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?
    );
    for issue in plan.validate() {
        println!("⚠️  {}", issue);
    }
    Ok(())
}

pub async fn ask(runtime: &Runtime, worker: &str, message: &str) -> Result<()> {
    let workers = runtime.workers();
    let Some(agent) = workers.get(worker) else {
        bail!(
            "Unknown worker '{}'. Available: {}",
            worker,
            workers.names().join(", ")
        );
    };

    match agent.think(message, &Map::new()).await {
        Ok(reply) => {
            println!("{}", reply.content);
            if !reply.capabilities_used.is_empty() {
                println!("\n🔧 {}", reply.capabilities_used.join(", "));
            }
            Ok(())
        }
        Err(e) => bail!(format_error_for_cli(&e)),
    }
}
