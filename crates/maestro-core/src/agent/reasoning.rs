//! Agent - the think/act/observe loop
//!
//! One `think` call assembles `system prompt + history + user message`,
//! calls the model, and either returns the reply as the final answer or, when
//! the reply is a capability call, invokes the capability and feeds the
//! result back as a user message. Only the final user/assistant pair is
//! committed to history, so capability round-trips never consume history.
//!
//! With reflection enabled, every capability result is followed by an extra
//! model call that critiques it; the verdict is logged and returned with
//! the reply but does not enter the conversation.

use super::critique::{critique_prompt, parse_critique, Critique};
use super::history::{ConversationHistory, DEFAULT_HISTORY_WINDOW};
use super::session::{ContextUsage, SessionSummary, TurnLog};
use super::worker::{AgentReply, Worker};
use crate::error::Result;
use crate::parser::{ResponseParser, ToolCall};
use crate::utils::{retry_with_backoff, RetryConfig};
use maestro_llm::{CompletionRequest, LlmProvider, Message};
use maestro_tools::{CapabilityInvoker, InvocationError, InvocationOutcome, InvocationRecord};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Returned when the loop exhausts its iterations without a final answer
pub const ITERATION_LIMIT_MESSAGE: &str =
    "I've reached my reasoning limit. Let me summarize what I found so far...";

/// Reasoning loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Model calls allowed per `think`
    pub max_iterations: usize,
    /// Messages kept in history
    pub history_window: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: u32,
    /// Model override; `None` uses the provider default
    pub model: Option<String>,
    /// Critique each capability result with an extra model call
    pub reflect: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            history_window: DEFAULT_HISTORY_WINDOW,
            temperature: 0.2,
            max_tokens: 2000,
            model: None,
            reflect: false,
        }
    }
}

impl AgentConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration bound (at least one)
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the history window
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token cap
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Pin a model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Enable or disable reflection on capability results
    #[must_use]
    pub fn with_reflection(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }
}

struct AgentState {
    history: ConversationHistory,
    turns: TurnLog,
}

/// A worker backed by a model and a capability subset
pub struct Agent {
    name: String,
    system_prompt: String,
    provider: Arc<dyn LlmProvider>,
    invoker: CapabilityInvoker,
    parser: ResponseParser,
    retry: RetryConfig,
    config: AgentConfig,
    state: Mutex<AgentState>,
}

impl Agent {
    /// Create an agent.
    ///
    /// When the invoker's registry is non-empty, a description of its
    /// capabilities is appended to `system_prompt`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        invoker: CapabilityInvoker,
    ) -> Self {
        let mut system_prompt = system_prompt.into();
        if !invoker.registry().is_empty() {
            system_prompt.push_str("\n\nCapabilities:\n");
            system_prompt.push_str(&invoker.registry().describe());
        }

        let config = AgentConfig::default();
        Self {
            name: name.into(),
            system_prompt,
            provider,
            invoker,
            parser: ResponseParser::default(),
            retry: RetryConfig::default(),
            state: Mutex::new(AgentState {
                history: ConversationHistory::new(config.history_window),
                turns: TurnLog::default(),
            }),
            config,
        }
    }

    /// Replace the loop settings; resets history to the new window
    #[must_use]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.state = Mutex::new(AgentState {
            history: ConversationHistory::new(config.history_window),
            turns: TurnLog::default(),
        });
        self.config = config;
        self
    }

    /// Use a different reply parser
    #[must_use]
    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    /// Set the retry policy for capability calls
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Full system prompt sent on every call
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Loop settings
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Messages currently committed to history
    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }

    /// Aggregate statistics of recent turns
    pub async fn session_summary(&self) -> SessionSummary {
        self.state.lock().await.turns.summary()
    }

    /// Digest of the last few turns
    pub async fn memory_context(&self) -> String {
        self.state.lock().await.turns.memory_context()
    }

    /// Estimated prompt size of the next call against `context_window`
    pub async fn context_usage(&self, context_window: usize) -> ContextUsage {
        let state = self.state.lock().await;
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(state.history.messages().cloned());
        ContextUsage::estimate(&messages, context_window)
    }

    fn request(&self, messages: &[Message]) -> CompletionRequest {
        let model = self.config.model.clone().unwrap_or_default();
        CompletionRequest::new(model)
            .with_messages(messages.to_vec())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }

    async fn invoke_with_retry(&self, call: &ToolCall) -> (InvocationOutcome, InvocationRecord) {
        let start = Instant::now();
        let result = retry_with_backoff(
            &self.retry,
            || self.invoker.invoke(&call.name, &call.arguments),
            |e: &InvocationError| e.is_retryable(),
        )
        .await;

        let (outcome, attempts) = match result {
            Ok(retried) => (Ok(retried.value), retried.attempts),
            Err(failed) => (Err(failed.last_error), failed.attempts),
        };

        let record = InvocationRecord::new(
            call.name.clone(),
            call.arguments.clone(),
            &outcome,
            start.elapsed().as_millis() as u64,
            attempts,
        );
        info!(
            agent = %self.name,
            capability = %record.capability_name,
            duration_ms = record.duration_ms,
            attempts = record.attempt_count,
            succeeded = record.succeeded(),
            "Capability invoked"
        );

        (outcome, record)
    }

    /// Ask the model to judge one capability call; returns the verdict and
    /// the tokens spent on it
    async fn critique(&self, goal: &str, call: &ToolCall, result: &Value) -> (Critique, u32) {
        let action = format!("{}({})", call.name, Value::Object(call.arguments.clone()));
        let prompt = critique_prompt(goal, &action, result);

        let request = self.request(&[Message::user(prompt)]);
        let (critique, tokens) = match self.provider.complete(request).await {
            Ok(response) => (
                parse_critique(&response.content, result),
                response.total_tokens(),
            ),
            Err(e) => {
                warn!(agent = %self.name, error = %e, "Critique failed, judging from the result");
                (Critique::fallback(result), 0)
            }
        };

        info!(
            agent = %self.name,
            capability = %call.name,
            success = critique.success,
            effectiveness = critique.effectiveness,
            should_retry = critique.should_retry,
            "Capability critiqued"
        );
        (critique, tokens)
    }
}

fn augment_with_context(message: &str, context: &Map<String, Value>) -> String {
    if context.is_empty() {
        return message.to_string();
    }
    let rendered = serde_json::to_string_pretty(context)
        .unwrap_or_else(|_| Value::Object(context.clone()).to_string());
    format!("{}\n\nContext:\n{}", message, rendered)
}

#[async_trait::async_trait]
impl Worker for Agent {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, message, context), fields(agent = %self.name))]
    async fn think(&self, message: &str, context: &Map<String, Value>) -> Result<AgentReply> {
        let user_message = augment_with_context(message, context);

        let mut messages = {
            let state = self.state.lock().await;
            let mut messages = Vec::with_capacity(state.history.len() + 2);
            messages.push(Message::system(self.system_prompt.clone()));
            messages.extend(state.history.messages().cloned());
            messages
        };
        messages.push(Message::user(user_message.clone()));

        let mut reply = AgentReply::default();

        for iteration in 1..=self.config.max_iterations {
            reply.iterations = iteration;

            let response = self.provider.complete(self.request(&messages)).await?;
            reply.tokens = reply.tokens.saturating_add(response.total_tokens());

            let Some(call) = self.parser.parse(&response.content) else {
                debug!(iteration, "Final answer");
                let mut state = self.state.lock().await;
                state.history.push_exchange(user_message, response.content.clone());
                state.turns.record(
                    message,
                    &response.content,
                    reply.capabilities_used.clone(),
                    reply.tokens,
                );
                reply.content = response.content;
                return Ok(reply);
            };

            debug!(iteration, capability = %call.name, "Capability call requested");
            let (outcome, record) = self.invoke_with_retry(&call).await;
            if self.config.reflect {
                let (critique, tokens) = self.critique(message, &call, &record.outcome).await;
                reply.tokens = reply.tokens.saturating_add(tokens);
                reply.critiques.push(critique);
            }

            reply.capabilities_used.push(call.name);
            messages.push(Message::assistant(response.content));
            messages.push(Message::user(format!("Tool result: {}", record.outcome)));
            if let Err(e) = &outcome {
                debug!(kind = e.kind.as_str(), error = %e.message, "Capability failed");
            }
            reply.invocations.push(record);
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Reasoning limit reached"
        );
        self.state.lock().await.turns.record(
            message,
            ITERATION_LIMIT_MESSAGE,
            reply.capabilities_used.clone(),
            reply.tokens,
        );
        reply.content = ITERATION_LIMIT_MESSAGE.to_string();
        reply.limit_reached = true;
        Ok(reply)
    }

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.history.clear();
        state.turns.clear();
        debug!(agent = %self.name, "Agent reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_llm::{MessageRole, MockProvider};
    use maestro_tools::{ParamSpec, ParamType, Tool, ToolDefinition, ToolRegistry};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter {
        definition: ToolDefinition,
        calls: Arc<AtomicUsize>,
        fail_with: Option<fn() -> maestro_tools::Error>,
    }

    impl Counter {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                definition: ToolDefinition::new("count", "Count calls").with_param(
                    ParamSpec::optional("step", ParamType::Integer, "Increment", json!(1)),
                ),
                calls,
                fail_with: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for Counter {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, arguments: Map<String, Value>) -> maestro_tools::Result<Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            Ok(json!({"calls": n, "step": arguments["step"]}))
        }
    }

    fn network_error() -> maestro_tools::Error {
        maestro_tools::Error::Network("connection reset".into())
    }

    fn logic_error() -> maestro_tools::Error {
        maestro_tools::Error::Execution("bad state".into())
    }

    fn agent_with(provider: Arc<MockProvider>, tool: Counter) -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool));
        let invoker = CapabilityInvoker::with_defaults(Arc::new(registry));
        Agent::new("tester", "You test things.", provider, invoker).with_retry(
            RetryConfig::default().with_initial_delay(Duration::from_millis(1)),
        )
    }

    const CALL: &str = r#"{"tool": "count", "arguments": {"step": "2"}}"#;

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(MockProvider::always("42"));
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = agent_with(provider.clone(), Counter::new(calls.clone()));

        let reply = agent.think("What is the answer?", &Map::new()).await.unwrap();
        assert_eq!(reply.content, "42");
        assert_eq!(reply.iterations, 1);
        assert!(!reply.limit_reached);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(agent.history_len().await, 2);

        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[0].content.contains("count"));
        assert_eq!(request.messages[1].content, "What is the answer?");
    }

    #[tokio::test]
    async fn test_capability_round_trip() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response(CALL);
        provider.add_response("done");
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = agent_with(provider.clone(), Counter::new(calls.clone()));

        let reply = agent.think("count please", &Map::new()).await.unwrap();
        assert_eq!(reply.content, "done");
        assert_eq!(reply.iterations, 2);
        assert_eq!(reply.capabilities_used, vec!["count".to_string()]);
        assert_eq!(reply.tokens, 30);
        assert_eq!(reply.invocations.len(), 1);
        assert_eq!(reply.invocations[0].outcome["step"], json!(2));
        assert!(reply.critiques.is_empty());
        assert_eq!(provider.call_count(), 2);

        let requests = provider.requests();
        let second = &requests[1];
        let n = second.messages.len();
        assert_eq!(second.messages[n - 2].content, CALL);
        assert!(second.messages[n - 1].content.starts_with("Tool result: "));

        // Only the final pair is committed
        assert_eq!(agent.history_len().await, 2);
    }

    #[tokio::test]
    async fn test_reflection_critiques_each_call() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response(CALL);
        provider.add_response(
            r#"{"success": true, "effectiveness": 0.9, "reasoning": "counted", "next_action": "answer"}"#,
        );
        provider.add_response("done");
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = agent_with(provider.clone(), Counter::new(calls.clone()))
            .with_config(AgentConfig::default().with_reflection(true));

        let reply = agent.think("count please", &Map::new()).await.unwrap();
        assert_eq!(reply.content, "done");
        assert_eq!(reply.tokens, 45);
        assert_eq!(reply.critiques.len(), 1);
        assert_eq!(reply.critiques[0].reasoning, "counted");
        assert_eq!(reply.critiques[0].effectiveness, 0.9);

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].messages.len(), 1);
        assert!(requests[1].messages[0].content.contains("Goal: count please"));
        assert!(requests[1].messages[0].content.contains("Action Taken: count("));
        // The critique stays out of the conversation
        assert!(requests[2]
            .messages
            .iter()
            .all(|m| !m.content.contains("counted")));
    }

    #[tokio::test]
    async fn test_reflection_falls_back_on_bad_critique() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response(CALL);
        provider.add_response("It went well, I think.");
        provider.add_response(CALL);
        provider.add_failure("connection refused");
        provider.add_response("done");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut counter = Counter::new(calls.clone());
        counter.fail_with = Some(logic_error);
        let agent = agent_with(provider, counter)
            .with_config(AgentConfig::default().with_reflection(true));

        let reply = agent.think("count please", &Map::new()).await.unwrap();
        assert_eq!(reply.content, "done");
        assert_eq!(reply.critiques.len(), 2);
        for critique in &reply.critiques {
            assert!(!critique.success);
            assert_eq!(critique.reasoning, "Unable to evaluate");
            assert!(!critique.should_retry);
        }
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let provider = Arc::new(MockProvider::always(CALL));
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = agent_with(provider.clone(), Counter::new(calls.clone()))
            .with_config(AgentConfig::default().with_max_iterations(3));

        let reply = agent.think("loop forever", &Map::new()).await.unwrap();
        assert_eq!(reply.content, ITERATION_LIMIT_MESSAGE);
        assert!(reply.limit_reached);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(agent.history_len().await, 0);
        assert_eq!(agent.session_summary().await.total_queries, 1);
    }

    #[tokio::test]
    async fn test_capability_error_is_observed() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response(r#"{"tool": "missing", "arguments": {}}"#);
        provider.add_response("gave up");
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = agent_with(provider.clone(), Counter::new(calls));

        let reply = agent.think("x", &Map::new()).await.unwrap();
        assert_eq!(reply.content, "gave up");
        assert!(!reply.invocations[0].succeeded());

        let observation = provider.requests()[1].messages.last().cloned().unwrap();
        assert!(observation.content.contains("Tool 'missing' not found"));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response(CALL);
        provider.add_response("ok");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tool = Counter::new(calls.clone());
        tool.fail_with = Some(network_error);
        let agent = agent_with(provider, tool);

        let reply = agent.think("x", &Map::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(reply.invocations[0].attempt_count, 3);
        assert_eq!(reply.invocations[0].outcome["error_type"], "NETWORK_ERROR");
    }

    #[tokio::test]
    async fn test_logic_failure_is_not_retried() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response(CALL);
        provider.add_response("ok");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tool = Counter::new(calls.clone());
        tool.fail_with = Some(logic_error);
        let agent = agent_with(provider, tool);

        let reply = agent.think("x", &Map::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(reply.invocations[0].attempt_count, 1);
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let provider = Arc::new(MockProvider::new());
        provider.add_failure("connection refused");
        let agent = agent_with(provider, Counter::new(Arc::new(AtomicUsize::new(0))));

        let err = agent.think("x", &Map::new()).await.unwrap_err();
        assert!(matches!(err, crate::Error::Llm(_)));
        assert_eq!(agent.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_context_is_appended() {
        let provider = Arc::new(MockProvider::always("ok"));
        let agent = agent_with(provider.clone(), Counter::new(Arc::new(AtomicUsize::new(0))));

        let mut context = Map::new();
        context.insert("step_1_result".into(), json!("facts"));
        agent.think("analyze", &context).await.unwrap();

        let requests = provider.requests();
        let sent = &requests[0].messages[1].content;
        assert!(sent.starts_with("analyze\n\nContext:\n"));
        assert!(sent.contains("\"step_1_result\": \"facts\""));
    }

    #[tokio::test]
    async fn test_history_stays_bounded() {
        let provider = Arc::new(MockProvider::always("ok"));
        let agent = agent_with(provider.clone(), Counter::new(Arc::new(AtomicUsize::new(0))))
            .with_config(AgentConfig::default().with_history_window(4));

        for i in 0..6 {
            agent.think(&format!("q{}", i), &Map::new()).await.unwrap();
            assert!(agent.history_len().await <= 4);
        }

        // system + 4 history + current
        assert_eq!(provider.requests().last().unwrap().messages.len(), 6);

        agent.reset().await;
        assert_eq!(agent.history_len().await, 0);
        assert_eq!(agent.session_summary().await.total_queries, 0);
    }
}
