//! Integration tests for Maestro
//!
//! These tests drive the crates together through a scripted model backend:
//! - maestro-llm: the mock provider stands in for Ollama
//! - maestro-tools: builtin capabilities and argument coercion
//! - maestro-core: planning, execution and synthesis
//! - maestro-memory: run results feeding later planning

use std::sync::Arc;

use maestro_core::{
    parse_tool_call, Orchestrator, OrchestratorConfig, RunStatus, StepStatus, WorkerSettings,
};
use maestro_llm::MockProvider;
use maestro_memory::{LongTermMemory, MemoryStore};
use maestro_tools::{
    register_builtins, BuiltinsConfig, CapabilityInvoker, FailureKind, ToolRegistry,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

const TWO_STEP_PLAN: &str = r#"Here is the plan:
{
  "steps": [
    {"id": 1, "agent": "researcher", "action": "Find facts about Rust", "dependencies": []},
    {"id": 2, "agent": "analyst", "action": "Analyze the facts", "dependencies": [1]}
  ],
  "rationale": "Research first, then analyze"
}"#;

fn builtin_tools() -> (TempDir, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    register_builtins(
        &mut registry,
        &BuiltinsConfig::default().with_output_dir(dir.path()),
    )
    .unwrap();
    (dir, registry)
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// End-to-end runs
// ============================================================================

#[tokio::test]
async fn test_two_step_run_end_to_end() {
    let (_dir, tools) = builtin_tools();
    let provider = Arc::new(MockProvider::new());
    provider.add_response(TWO_STEP_PLAN);
    provider.add_response("facts");
    provider.add_response("insight");

    let memory = Arc::new(LongTermMemory::in_memory());
    let orchestrator = Orchestrator::standard(
        provider.clone(),
        &tools,
        &WorkerSettings::default(),
        OrchestratorConfig::default(),
    )
    .with_memory(memory.clone());

    let result = orchestrator
        .process_task("Tell me about Rust", &Map::new())
        .await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.plan.steps.len(), 2);
    assert_eq!(result.results[&1].output.as_deref(), Some("facts"));
    assert_eq!(result.results[&2].output.as_deref(), Some("insight"));
    assert!(result.final_output.starts_with("# Results for: Tell me about Rust"));
    assert!(result.final_output.contains("## Step 1: Researcher\n\nfacts"));
    assert!(result.final_output.contains("## Step 2: Analyst\n\ninsight"));
    assert_eq!(result.log.len(), 2);

    // The analyst saw the researcher's output
    let requests = provider.requests();
    let analyst_prompt = &requests[2].messages.last().unwrap().content;
    assert!(analyst_prompt.contains("step_1_result"));
    assert!(analyst_prompt.contains("facts"));

    // The run was remembered for later tasks
    let recalled = memory.retrieve("Rust", 3).await.unwrap();
    assert_eq!(recalled.len(), 1);
    assert!(recalled[0].content.contains("Task: Tell me about Rust"));
}

#[tokio::test]
async fn test_worker_uses_capability_during_run() {
    let (_dir, tools) = builtin_tools();
    let provider = Arc::new(MockProvider::new());
    provider.add_response(
        r#"{"steps": [{"id": 1, "agent": "analyst", "action": "Summarize the notes"}]}"#,
    );
    provider.add_response(
        r#"{"tool": "create_summary", "arguments": {"content": "one two three four", "max_length": "2"}}"#,
    );
    provider.add_response("The notes start with one two");

    let orchestrator = Orchestrator::standard(
        provider.clone(),
        &tools,
        &WorkerSettings::default(),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.process_task("Summarize", &Map::new()).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.final_output, "The notes start with one two");

    let requests = provider.requests();
    let observation = &requests[2].messages.last().unwrap().content;
    assert!(observation.starts_with("Tool result:"));
    assert!(observation.contains("one two..."));
}

#[tokio::test]
async fn test_unparseable_plan_falls_back_to_researcher() {
    let (_dir, tools) = builtin_tools();
    let provider = Arc::new(MockProvider::new());
    provider.add_response("I would start by reading a lot.");
    provider.add_response("Here is what I found");

    let orchestrator = Orchestrator::standard(
        provider,
        &tools,
        &WorkerSettings::default(),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.process_task("Study tides", &Map::new()).await;

    assert!(result.plan.is_fallback());
    assert_eq!(result.plan.steps[0].worker, "researcher");
    assert_eq!(result.plan.steps[0].action, "Study tides");
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.final_output, "Here is what I found");
}

#[tokio::test]
async fn test_backend_outage_fails_every_step() {
    let (_dir, tools) = builtin_tools();
    let provider = Arc::new(MockProvider::new());
    provider.add_response(TWO_STEP_PLAN);
    provider.add_failure("connection refused");

    let memory = Arc::new(LongTermMemory::in_memory());
    let orchestrator = Orchestrator::standard(
        provider,
        &tools,
        &WorkerSettings::default(),
        OrchestratorConfig::default(),
    )
    .with_memory(memory.clone());

    let result = orchestrator.process_task("Tell me about Rust", &Map::new()).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.results[&1].status, StepStatus::Error);
    assert_eq!(result.results[&2].status, StepStatus::Failed);
    assert_eq!(
        result.results[&2].error.as_deref(),
        Some("dependency 1 did not succeed")
    );
    assert!(memory.get_all().await.is_empty());
}

// ============================================================================
// Capabilities
// ============================================================================

#[tokio::test]
async fn test_invoker_coerces_model_arguments() {
    let (_dir, tools) = builtin_tools();
    let invoker = CapabilityInvoker::with_defaults(Arc::new(tools));

    let value = invoker
        .invoke(
            "create_summary",
            &args(json!({"content": "alpha beta gamma delta", "max_length": "3"})),
        )
        .await
        .unwrap();
    assert_eq!(value["summary"], json!("alpha beta gamma..."));
    assert_eq!(value["summary_length"], json!(3));
}

#[tokio::test]
async fn test_invoker_reports_structured_failures() {
    let (_dir, tools) = builtin_tools();
    let invoker = CapabilityInvoker::with_defaults(Arc::new(tools));

    let missing = invoker.invoke("teleport", &Map::new()).await.unwrap_err();
    assert_eq!(missing.kind, FailureKind::NotFound);
    assert!(!missing.is_retryable());

    let invalid = invoker
        .invoke("create_summary", &args(json!({"max_length": 3})))
        .await
        .unwrap_err();
    assert_eq!(invalid.kind, FailureKind::InvalidInput);
}

#[tokio::test]
async fn test_file_capabilities_share_output_dir() {
    let (dir, tools) = builtin_tools();
    let invoker = CapabilityInvoker::with_defaults(Arc::new(tools));

    invoker
        .invoke(
            "save_file",
            &args(json!({"filename": "report.md", "content": "# Report"})),
        )
        .await
        .unwrap();
    assert!(dir.path().join("report.md").exists());

    let read = invoker
        .invoke("read_file", &args(json!({"filename": "report.md"})))
        .await
        .unwrap();
    assert_eq!(read["content"], json!("# Report"));
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_model_reply_grammars() {
    let call = parse_tool_call(
        "Searching now.\n{\"tool\": \"web_search\", \"arguments\": {\"query\": \"rust\"}}",
    )
    .unwrap();
    assert_eq!(call.name, "web_search");

    let call = parse_tool_call("web_search(query='rust', max_results=2)").unwrap();
    assert_eq!(call.arguments["query"], json!("rust"));

    assert!(parse_tool_call("Rust is a systems language.").is_none());
}
