//! Interactive chat with a single worker

use crate::runtime::Runtime;
use anyhow::{bail, Result};
use maestro_core::{format_error_for_cli, persona, Worker};
use maestro_llm::MessageRole;
use maestro_memory::ShortTermMemory;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

const CONTEXT_WINDOW: usize = 8192;

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Reset,
    History,
    Stats,
    Help,
    Unknown(&'a str),
    Message(&'a str),
}

fn classify(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line {
        "/exit" | "/quit" => Input::Exit,
        "/reset" => Input::Reset,
        "/history" => Input::History,
        "/stats" => Input::Stats,
        "/help" => Input::Help,
        other if other.starts_with('/') => Input::Unknown(other),
        other => Input::Message(other),
    })
}

fn print_help() {
    println!("Commands: /history  /stats  /reset  /help  /exit");
}

pub async fn run(runtime: &Runtime, worker: &str) -> Result<()> {
    let Some(persona) = persona(&worker.to_lowercase()).filter(|p| !p.capabilities.is_empty())
    else {
        bail!("Unknown worker '{}'", worker);
    };
    let agent = persona.build(runtime.provider.clone(), &runtime.tools, &runtime.settings);
    let mut transcript = ShortTermMemory::new(runtime.config.memory.short_term_window);

    println!("💬 Chatting with {} ({})", persona.title, persona.role);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(input) = classify(&line) else {
            continue;
        };

        match input {
            Input::Exit => break,
            Input::Help => print_help(),
            Input::Unknown(command) => println!("Unknown command: {}", command),
            Input::Reset => {
                agent.reset().await;
                transcript.clear();
                println!("🧹 Conversation cleared");
            }
            Input::History => {
                if transcript.is_empty() {
                    println!("(empty)");
                } else {
                    println!("{}", transcript.context_string(transcript.capacity()));
                }
            }
            Input::Stats => {
                let summary = agent.session_summary().await;
                let usage = agent.context_usage(CONTEXT_WINDOW).await;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                println!(
                    "Context: ~{} tokens ({:.1}% of {})",
                    usage.estimated_tokens, usage.usage_percent, usage.context_window
                );
                let recent = agent.memory_context().await;
                if !recent.is_empty() {
                    println!("Recent: {}", recent);
                }
            }
            Input::Message(message) => {
                transcript.add_message(MessageRole::User, message, None);
                match agent.think(message, &Map::new()).await {
                    Ok(reply) => {
                        println!("{}", reply.content);
                        let mut metadata = Map::new();
                        metadata.insert(
                            "capabilities_used".to_string(),
                            Value::from(reply.capabilities_used.clone()),
                        );
                        transcript.add_message(MessageRole::Assistant, reply.content, Some(metadata));
                    }
                    Err(e) => eprintln!("{}", format_error_for_cli(&e)),
                }
            }
        }
    }

    println!("👋 Bye");
    Ok(())
}
