//! Wiring: model backend, capabilities, workers, memory and orchestrator.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use maestro_core::{Orchestrator, WorkerRegistry, WorkerSettings};
use maestro_llm::{LlmProvider, OllamaProvider};
use maestro_memory::LongTermMemory;
use maestro_tools::{register_builtins, ToolRegistry};
use std::sync::Arc;
use tracing::info;

/// Everything a command needs, built once from configuration
pub struct Runtime {
    pub config: AppConfig,
    pub provider: Arc<dyn LlmProvider>,
    pub tools: ToolRegistry,
    pub settings: WorkerSettings,
    pub memory: Arc<LongTermMemory>,
}

impl Runtime {
    pub async fn build(config: AppConfig) -> Result<Self> {
        let provider = OllamaProvider::new(config.ollama())
            .context("Failed to create model backend")?;

        let mut tools = ToolRegistry::new();
        register_builtins(&mut tools, &config.builtins())
            .context("Failed to register builtin capabilities")?;

        let memory = LongTermMemory::open(&config.memory.long_term_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open long-term memory at {}",
                    config.memory.long_term_path.display()
                )
            })?;

        info!(
            model = %config.llm.model,
            capabilities = tools.len(),
            "Runtime ready"
        );

        Ok(Self {
            settings: config.worker_settings(),
            provider: Arc::new(provider),
            tools,
            memory: Arc::new(memory),
            config,
        })
    }

    pub fn workers(&self) -> WorkerRegistry {
        WorkerRegistry::standard(self.provider.clone(), &self.tools, &self.settings)
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::standard(
            self.provider.clone(),
            &self.tools,
            &self.settings,
            self.config.orchestrator(),
        )
        .with_memory(self.memory.clone())
    }
}
