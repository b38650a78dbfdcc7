//! Long-term memory commands

use crate::runtime::Runtime;
use anyhow::{Context, Result};
use clap::Subcommand;
use maestro_memory::MemoryStore;

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Record count and storage location
    Stats,
    /// Keyword search over stored memories
    Search {
        /// Query text
        query: String,
        /// Maximum number of results
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Delete every stored memory
    Clear,
}

pub async fn run(runtime: &Runtime, action: MemoryAction) -> Result<()> {
    match action {
        MemoryAction::Stats => {
            let stats = runtime.memory.stats().await;
            println!("🧠 Memories: {}", stats.total_memories);
            if let Some(path) = stats.storage_path {
                println!("   Stored at: {}", path.display());
            }
        }
        MemoryAction::Search { query, top_k } => {
            let top_k = top_k.unwrap_or(runtime.config.memory.top_k);
            let records = runtime
                .memory
                .retrieve(&query, top_k)
                .await
                .context("Memory search failed")?;
            if records.is_empty() {
                println!("No matching memories");
            }
            for record in records {
                println!(
                    "[{}] {}\n{}\n",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.content
                );
            }
        }
        MemoryAction::Clear => {
            runtime.memory.clear().await.context("Failed to clear memory")?;
            println!("🧹 Long-term memory cleared");
        }
    }
    Ok(())
}
