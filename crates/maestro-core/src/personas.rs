//! Personas - Built-in worker presets and the worker registry
//!
//! A persona fixes a worker's system prompt, sampling temperature and the
//! subset of capabilities it may call. `WorkerRegistry` maps lowercase worker
//! names to shared `Worker` instances and is built once at startup.

use crate::agent::{Agent, AgentConfig, Worker};
use crate::parser::{ParserConfig, ResponseParser};
use crate::utils::RetryConfig;
use maestro_llm::LlmProvider;
use maestro_tools::{CapabilityInvoker, InvokerConfig, ToolRegistry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Static description of a worker
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Persona {
    /// Registry name, as it appears in plans
    pub id: &'static str,
    /// Display name, used in synthesized headings
    pub title: &'static str,
    /// One-line role description
    pub role: &'static str,
    /// System prompt
    pub prompt: &'static str,
    /// Sampling temperature
    pub temperature: f32,
    /// Capabilities this worker may call
    pub capabilities: &'static [&'static str],
}

/// Information gathering
pub const RESEARCHER: Persona = Persona {
    id: "researcher",
    title: "Researcher",
    role: "Information Gathering and Research",
    prompt: r#"You are a research agent specialized in gathering and synthesizing information.

Your capabilities:
- Search the web for current information
- Evaluate source credibility
- Synthesize findings from multiple sources
- Cite sources properly

When you need to search, respond with only:
{"tool": "web_search", "arguments": {"query": "your search query", "max_results": 5}}

After gathering information, provide:
1. Key findings (bullet points)
2. Source citations (with URLs)
3. Relevance assessment
4. Any gaps in available information

Be thorough but concise. Focus on factual, well-sourced information."#,
    temperature: 0.2,
    capabilities: &["web_search"],
};

/// Data analysis and synthesis
pub const ANALYST: Persona = Persona {
    id: "analyst",
    title: "Analyst",
    role: "Data Analysis and Synthesis",
    prompt: r#"You are an analytical agent specialized in processing and interpreting information.

Your capabilities:
- Identify patterns and trends in data
- Synthesize information from multiple sources
- Draw insights and conclusions
- Provide evidence-based recommendations

When analyzing, focus on:
1. Key patterns and trends
2. Notable outliers or anomalies
3. Correlations and relationships
4. Actionable insights
5. Confidence levels in findings

Tool call format:
{"tool": "analyze_data", "arguments": {"data": [1, 2, 3], "analysis_type": "trend"}}

Be objective and evidence-based. Clearly distinguish between facts and interpretations."#,
    temperature: 0.2,
    capabilities: &["analyze_data", "create_summary"],
};

/// Content creation
pub const WRITER: Persona = Persona {
    id: "writer",
    title: "Writer",
    role: "Content Creation and Documentation",
    prompt: r##"You are a professional writer agent specialized in creating clear, engaging content.

Your capabilities:
- Write reports, documentation, and articles
- Structure information logically
- Adapt tone and style to audience
- Create well-formatted markdown documents

When writing, ensure:
1. Clear structure (intro, body, conclusion)
2. Proper formatting (headers, lists, emphasis)
3. Citations for sources
4. Professional tone

Tool call format:
{"tool": "save_file", "arguments": {"filename": "report.md", "content": "# Report..."}}

Focus on clarity, accuracy, and readability."##,
    temperature: 0.4,
    capabilities: &["save_file", "read_file"],
};

/// Code generation
pub const CODER: Persona = Persona {
    id: "coder",
    title: "Coder",
    role: "Code Generation and Analysis",
    prompt: r#"You are an expert coding agent specialized in software development.

Your capabilities:
- Generate production-quality code
- Explain code and algorithms
- Debug and optimize code
- Write tests and documentation

Tool call format:
{"tool": "execute_code", "arguments": {"code": "print('hello')", "language": "python"}}

When generating code:
- Explain your approach
- Include usage examples
- Add error handling
- Write tests if requested"#,
    temperature: 0.2,
    capabilities: &["execute_code", "save_file"],
};

/// Task decomposition; never calls capabilities
pub const PLANNER: Persona = Persona {
    id: "planner",
    title: "Planner",
    role: "Task Planning and Decomposition",
    prompt: r#"You are a strategic planning agent. Your role is to:

1. Analyze user requests and break them into clear, actionable steps
2. Identify which specialist agents are needed (researcher, analyst, writer, coder)
3. Determine dependencies between steps
4. Create a structured execution plan

When creating a plan, respond with a JSON object:
{
    "steps": [
        {
            "id": 1,
            "agent": "researcher",
            "action": "Search for recent AI agent research papers",
            "dependencies": [],
            "expected_output": "List of relevant papers with summaries"
        },
        {
            "id": 2,
            "agent": "analyst",
            "action": "Identify key trends from research",
            "dependencies": [1],
            "expected_output": "Summary of 3-5 major trends"
        }
    ],
    "rationale": "Why this plan makes sense"
}

Available agents:
- researcher: Web search, information gathering
- analyst: Data analysis, trend identification, synthesis
- writer: Content creation, documentation, reports
- coder: Code generation, technical implementation

List steps so that every dependency comes before the step that needs it.
Be concise but thorough. Focus on actionable steps."#,
    temperature: 0.3,
    capabilities: &[],
};

/// The four workers a plan can name
pub const WORKER_PERSONAS: [Persona; 4] = [RESEARCHER, ANALYST, WRITER, CODER];

/// Look up a built-in persona (including the planner) by id
#[must_use]
pub fn persona(id: &str) -> Option<&'static Persona> {
    static PERSONAS: [Persona; 5] = [RESEARCHER, ANALYST, WRITER, CODER, PLANNER];
    PERSONAS.iter().find(|p| p.id == id)
}

/// Title for a worker name: the persona title, or the name capitalized
#[must_use]
pub fn worker_title(name: &str) -> String {
    if let Some(persona) = persona(name) {
        return persona.title.to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shared settings used to build persona agents
#[derive(Debug, Clone, Default)]
pub struct WorkerSettings {
    /// Loop settings; temperature is taken from the persona
    pub agent: AgentConfig,
    /// Per-invocation timeout
    pub invoker: InvokerConfig,
    /// Retry policy for capability calls
    pub retry: RetryConfig,
    /// Which reply grammars count as capability calls
    pub parser: ParserConfig,
}

impl Persona {
    /// Build an agent for this persona over the given capabilities
    #[must_use]
    pub fn build(
        &self,
        provider: Arc<dyn LlmProvider>,
        tools: &ToolRegistry,
        settings: &WorkerSettings,
    ) -> Agent {
        let subset = Arc::new(tools.subset(self.capabilities));
        let invoker = CapabilityInvoker::new(subset, settings.invoker.clone());
        let config = settings.agent.clone().with_temperature(self.temperature);

        Agent::new(self.id, self.prompt, provider, invoker)
            .with_config(config)
            .with_retry(settings.retry.clone())
            .with_parser(ResponseParser::new(settings.parser))
    }
}

/// Workers by lowercase name
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: BTreeMap<String, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding researcher, analyst, writer and coder
    #[must_use]
    pub fn standard(
        provider: Arc<dyn LlmProvider>,
        tools: &ToolRegistry,
        settings: &WorkerSettings,
    ) -> Self {
        let mut registry = Self::new();
        for persona in &WORKER_PERSONAS {
            registry.register(Arc::new(persona.build(provider.clone(), tools, settings)));
        }
        registry
    }

    /// Register a worker under its lowercased name, replacing any previous one
    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        self.workers.insert(worker.name().to_lowercase(), worker);
    }

    /// Look up a worker; names are case-insensitive
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Worker>> {
        self.workers.get(&name.to_lowercase()).cloned()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.workers.keys().map(String::as_str).collect()
    }

    /// Every registered worker
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Worker>> {
        self.workers.values()
    }

    /// Number of workers
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether no workers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("workers", &self.names())
            .finish()
    }
}
