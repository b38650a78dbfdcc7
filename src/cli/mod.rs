//! CLI module for Maestro
//!
//! - `run`: plan and execute a task
//! - `plan`: show the plan for a task without executing it
//! - `ask`: send one message to a single worker
//! - `chat`: interactive session with one worker
//! - `memory`: inspect or clear long-term memory

use crate::config::load_config;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use maestro_core::ExecutionOrder;
use serde_json::{Map, Value};

mod chat;
mod memory;
mod task;

/// Maestro CLI
#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(about = "Multi-agent task orchestration over a local language model")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan and execute a task
    Run {
        /// Task description
        task: String,
        /// Extra context as a JSON object
        #[arg(long)]
        context: Option<String>,
        /// Override the configured step ordering
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the plan for a task
    Plan {
        /// Task description
        task: String,
    },
    /// Ask a single worker
    Ask {
        /// Worker name (researcher, analyst, writer, coder)
        worker: String,
        /// Message
        message: String,
    },
    /// Interactive chat with one worker
    Chat {
        /// Worker name
        #[arg(long, default_value = "researcher")]
        worker: String,
    },
    /// Long-term memory
    Memory {
        #[command(subcommand)]
        action: memory::MemoryAction,
    },
}

/// Step ordering accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderArg {
    List,
    Topological,
}

impl From<OrderArg> for ExecutionOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::List => ExecutionOrder::ListOrder,
            OrderArg::Topological => ExecutionOrder::Topological,
        }
    }
}

/// Parse `--context` into a JSON object
pub fn parse_context(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw).context("--context is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--context must be a JSON object"),
    }
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let mut config = load_config()?;

    match command {
        Commands::Run {
            task,
            context,
            order,
            json,
        } => {
            if let Some(order) = order {
                config.orchestrator.execution_order = order.into();
            }
            let context = parse_context(context.as_deref())?;
            let runtime = Runtime::build(config).await?;
            task::run(&runtime, &task, &context, json).await
        }
        Commands::Plan { task } => {
            let runtime = Runtime::build(config).await?;
            task::plan(&runtime, &task).await
        }
        Commands::Ask { worker, message } => {
            let runtime = Runtime::build(config).await?;
            task::ask(&runtime, &worker, &message).await
        }
        Commands::Chat { worker } => {
            let runtime = Runtime::build(config).await?;
            chat::run(&runtime, &worker).await
        }
        Commands::Memory { action } => {
            let runtime = Runtime::build(config).await?;
            memory::run(&runtime, action).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context() {
        assert!(parse_context(None).unwrap().is_empty());
        let map = parse_context(Some(r#"{"audience": "engineers"}"#)).unwrap();
        assert_eq!(map["audience"], "engineers");
        assert!(parse_context(Some("[1, 2]")).is_err());
        assert!(parse_context(Some("{oops")).is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["maestro", "run", "study rust", "--order", "topological"]);
        match cli.command {
            Some(Commands::Run { task, order, .. }) => {
                assert_eq!(task, "study rust");
                assert!(matches!(order, Some(OrderArg::Topological)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
