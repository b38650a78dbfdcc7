//! Configuration loading
//!
//! Layers, lowest priority first: embedded `config/default.toml`, optional
//! `config/default`, `config/{MAESTRO_ENV}` and `config/local` files, then
//! `MAESTRO_<SECTION>__<KEY>` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use maestro_core::{
    AgentConfig, ExecutionOrder, OrchestratorConfig, ParserConfig, RetryConfig, WorkerSettings,
};
use maestro_llm::OllamaConfig;
use maestro_tools::{BuiltinsConfig, InvokerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub orchestrator: OrchestratorSection,
    pub tools: ToolsSection,
    pub memory: MemorySection,
}

/// `[llm]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

/// `[agent]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    pub max_iterations: usize,
    pub history_window: usize,
    #[serde(default = "default_true")]
    pub allow_call_syntax: bool,
    #[serde(default)]
    pub reflect: bool,
}

/// `[orchestrator]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSection {
    #[serde(default)]
    pub execution_order: ExecutionOrder,
    #[serde(default = "default_true")]
    pub remember_results: bool,
}

/// `[tools]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsSection {
    pub output_dir: PathBuf,
    pub python: String,
    pub timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_initial_delay_ms: u64,
}

/// `[memory]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySection {
    pub long_term_path: PathBuf,
    pub short_term_window: usize,
    pub top_k: usize,
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig::new()
            .with_base_url(&self.llm.base_url)
            .with_model(&self.llm.model)
            .with_max_tokens(self.llm.max_tokens)
            .with_timeout(Duration::from_secs(self.llm.timeout_secs))
    }

    pub fn builtins(&self) -> BuiltinsConfig {
        let mut builtins = BuiltinsConfig::default()
            .with_output_dir(&self.tools.output_dir)
            .with_python(&self.tools.python);
        builtins.search_timeout = Duration::from_secs(self.tools.search_timeout_secs);
        builtins
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            agent: AgentConfig::new()
                .with_max_iterations(self.agent.max_iterations)
                .with_history_window(self.agent.history_window)
                .with_max_tokens(self.llm.max_tokens)
                .with_model(&self.llm.model)
                .with_reflection(self.agent.reflect),
            invoker: InvokerConfig::default()
                .with_timeout(Duration::from_secs(self.tools.timeout_secs)),
            retry: RetryConfig::new()
                .with_max_attempts(self.tools.retry_attempts)
                .with_initial_delay(Duration::from_millis(self.tools.retry_initial_delay_ms)),
            parser: ParserConfig {
                allow_call_syntax: self.agent.allow_call_syntax,
            },
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig::new()
            .with_execution_order(self.orchestrator.execution_order)
            .with_remember_results(self.orchestrator.remember_results)
            .with_memory_top_k(self.memory.top_k)
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("MAESTRO_ENV").unwrap_or_else(|_| "development".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // prefix_separator("_") so MAESTRO_LLM__MODEL maps to llm.model
        .add_source(
            Environment::with_prefix("MAESTRO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
