//! Integration tests for graph execution
//!
//! These tests run compiled graphs end to end through the engine using mock
//! models, tools and checkpoint backends.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use switchyard::graph::{
    from_fn, node_fn, tools_condition, CheckpointBackend, CheckpointStore, Coordinator, Engine,
    FileBackend, GraphBuilder, GraphDefinition, MemoryBackend, MergeStrategy, ModelNode,
    NodeResult, Passthrough, RunOutcome, Target, ToolNode, ToolRegistry, ToolsRoute,
    WorkflowState, COMPLETED_STAGES, END,
};
use switchyard::kit::error::{BoxError, CheckpointError, ErrorCategory, RunError, RoutingError};
use switchyard::kit::message::{Message, Part, Role, ToolCallRequest};
use switchyard::kit::model::{GenerationConfig, Model};
use switchyard::kit::tool::Tool;
use switchyard::tools::AddTool;

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that returns predefined responses
struct MockModel {
    responses: Vec<Message>,
    response_index: AtomicUsize,
}

impl MockModel {
    fn new(responses: Vec<Message>) -> Self {
        Self {
            responses,
            response_index: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.response_index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        _history: &[Message],
        _config: Option<&GenerationConfig>,
        _tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Message, BoxError> {
        let idx = self.response_index.fetch_add(1, Ordering::SeqCst);
        if idx < self.responses.len() {
            Ok(self.responses[idx].clone())
        } else {
            Ok(Message::assistant("Max responses reached"))
        }
    }
}

/// Static schema for MockTool
static MOCK_TOOL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "input": {"type": "string"}
        }
    })
});

/// Mock tool that always fails
struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "lookup"
    }

    fn description(&self) -> &str {
        "Mock tool that always fails"
    }

    fn schema(&self) -> &Value {
        &MOCK_TOOL_SCHEMA
    }

    async fn execute(&self, _input: Value) -> Result<Value, BoxError> {
        Err("service unavailable".into())
    }
}

/// Checkpoint backend that can be told to fail reads or writes
#[derive(Default)]
struct FlakyBackend {
    fail_get: bool,
    fail_put: bool,
    puts: AtomicUsize,
    inner: MemoryBackend,
}

#[async_trait]
impl CheckpointBackend for FlakyBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CheckpointError> {
        if self.fail_get {
            return Err(CheckpointError::Unavailable("database offline".to_string()));
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CheckpointError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put {
            return Err(CheckpointError::Unavailable("disk full".to_string()));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CheckpointError> {
        self.inner.delete(key).await
    }
}

// ============================================================================
// Graph fixtures
// ============================================================================

/// agent -> tools -> agent loop with the built-in error node
async fn chat_graph(model: Arc<dyn Model>, tools: Vec<Arc<dyn Tool>>) -> GraphDefinition {
    let registry = ToolRegistry::with_tools(tools).await;
    let mut builder = GraphBuilder::new("chat");
    builder
        .register_node("agent", ModelNode::new("agent", model))
        .unwrap()
        .register_node("tools", ToolNode::new(Arc::new(registry)))
        .unwrap()
        .add_conditional_edge(
            "agent",
            tools_condition,
            [
                (ToolsRoute::Tools, Target::node("tools")),
                (ToolsRoute::End, Target::End),
            ],
        )
        .unwrap()
        .add_edge("tools", "agent")
        .unwrap()
        .set_entry("agent")
        .unwrap();
    builder.compile().unwrap()
}

fn count_of(state: &WorkflowState) -> i64 {
    state.get("count").and_then(Value::as_i64).unwrap_or(0)
}

/// Single node that increments `count`
fn counter_graph() -> GraphDefinition {
    let mut builder = GraphBuilder::new("counter");
    builder
        .field("count", MergeStrategy::Replace, Some(json!(0)))
        .unwrap()
        .register_node(
            "increment",
            from_fn(|state| Ok(NodeResult::new().set("count", json!(count_of(state) + 1)))),
        )
        .unwrap()
        .set_entry("increment")
        .unwrap();
    builder.compile().unwrap()
}

fn user_input(text: &str) -> WorkflowState {
    WorkflowState::empty().with_message(Message::user(text))
}

// ============================================================================
// Tool-calling loop
// ============================================================================

#[tokio::test]
async fn test_answer_without_tools() {
    let model = Arc::new(MockModel::new(vec![Message::assistant("Hello there!")]));
    let graph = chat_graph(model.clone(), vec![]).await;
    let engine = Engine::in_memory();

    let input = user_input("hi");
    let input_count = input.message_count();
    let report = engine
        .execute(&graph, input, "scenario-a", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.visited, vec!["agent"]);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.state.message_count(), input_count + 1);
    assert_eq!(
        report.state.last_message().unwrap().unwrap().content(),
        "Hello there!"
    );
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_tool_call_round_trip() {
    let request = ToolCallRequest::new("add", json!({"a": 2, "b": 2}));
    let model = Arc::new(MockModel::new(vec![
        Message::tool_calls(vec![request.clone()]),
        Message::assistant("4"),
    ]));
    let graph = chat_graph(model, vec![Arc::new(AddTool)]).await;

    let input = user_input("What is 2 + 2?");
    let input_count = input.message_count();
    let report = Engine::in_memory()
        .execute(&graph, input, "scenario-b", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.iterations, 3);
    assert_eq!(report.visited, vec!["agent", "tools", "agent"]);
    assert_eq!(report.state.message_count(), input_count + 3);

    let messages = report.state.messages().unwrap();
    assert!(messages[1].has_tool_calls());
    assert_eq!(messages[2].role, Role::Tool);
    match &messages[2].parts[0] {
        Part::ToolResult(result) => {
            assert_eq!(result.call_id, request.id);
            assert_eq!(result.output, json!(4));
            assert!(!result.is_error);
        }
        other => panic!("expected a tool result, got {:?}", other),
    }
    assert_eq!(messages[3].content(), "4");
}

#[tokio::test]
async fn test_tool_failure_is_reported_back_to_the_model() {
    let model = Arc::new(MockModel::new(vec![
        Message::tool_calls(vec![ToolCallRequest::new("lookup", json!({"input": "x"}))]),
        Message::assistant("The lookup service is down, sorry."),
    ]));
    let graph = chat_graph(model, vec![Arc::new(BrokenTool)]).await;

    let report = Engine::in_memory()
        .execute(&graph, user_input("look it up"), "s", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    let messages = report.state.messages().unwrap();
    match &messages[2].parts[0] {
        Part::ToolResult(result) => {
            assert!(result.is_error);
            assert!(result.output["error"]
                .as_str()
                .unwrap()
                .contains("service unavailable"));
        }
        other => panic!("expected a tool result, got {:?}", other),
    }
}

// ============================================================================
// Iteration ceiling
// ============================================================================

fn spinning_graph(runs: Arc<AtomicUsize>) -> GraphDefinition {
    let mut builder = GraphBuilder::new("spin");
    builder
        .register_node(
            "spin",
            from_fn(move |_| {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(NodeResult::new())
            }),
        )
        .unwrap()
        .add_conditional_edge(
            "spin",
            |_| "again".to_string(),
            [("again".to_string(), Target::node("spin"))],
        )
        .unwrap()
        .set_entry("spin")
        .unwrap();
    builder.compile().unwrap()
}

#[tokio::test]
async fn test_self_loop_stops_at_ceiling() {
    let runs = Arc::new(AtomicUsize::new(0));
    let graph = spinning_graph(runs.clone());
    assert!(!graph.reaches_end());

    let engine = Engine::in_memory().with_max_iterations(5);
    let report = engine
        .execute(&graph, user_input("go"), "s", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.iterations, 6);
    assert_eq!(runs.load(Ordering::SeqCst), 5);
    assert_eq!(report.visited.last().map(String::as_str), Some("error"));
    assert_eq!(
        report.outcome,
        RunOutcome::Recovered(ErrorCategory::BoundedIteration)
    );
    assert_eq!(
        report.state.last_message().unwrap().unwrap().content(),
        ErrorCategory::BoundedIteration.user_message()
    );
    assert!(report.state.error_marker().is_none());
}

#[tokio::test]
async fn test_default_ceiling_is_ten() {
    let runs = Arc::new(AtomicUsize::new(0));
    let graph = spinning_graph(runs.clone());

    let report = Engine::in_memory()
        .execute(&graph, WorkflowState::empty(), "s", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.iterations, 11);
    assert_eq!(runs.load(Ordering::SeqCst), 10);
}

// ============================================================================
// State merge semantics
// ============================================================================

#[tokio::test]
async fn test_append_order_and_replace_last_writer() {
    let mut builder = GraphBuilder::new("merge");
    builder
        .register_node(
            "a",
            from_fn(|_| {
                Ok(NodeResult::new()
                    .message(Message::assistant("m1"))
                    .set("x", json!("from a")))
            }),
        )
        .unwrap()
        .register_node(
            "b",
            from_fn(|_| {
                Ok(NodeResult::new()
                    .message(Message::assistant("m2"))
                    .set("x", json!("from b")))
            }),
        )
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_edge("b", END)
        .unwrap()
        .set_entry("a")
        .unwrap();
    let graph = builder.compile().unwrap();

    let state = Engine::in_memory()
        .run(&graph, user_input("start"), "s")
        .await
        .unwrap();

    let contents: Vec<String> = state
        .messages()
        .unwrap()
        .iter()
        .map(|m| m.content())
        .collect();
    assert_eq!(contents, vec!["start", "m1", "m2"]);
    assert_eq!(state.get("x"), Some(&json!("from b")));
}

// ============================================================================
// Sessions and checkpoints
// ============================================================================

#[tokio::test]
async fn test_sessions_are_isolated() {
    let graph = counter_graph();
    let engine = Engine::in_memory();

    engine.run(&graph, WorkflowState::empty(), "s1").await.unwrap();
    engine.run(&graph, WorkflowState::empty(), "s1").await.unwrap();
    let before = engine.checkpoints().get("s1").await.unwrap().unwrap();

    let s2 = engine.run(&graph, WorkflowState::empty(), "s2").await.unwrap();
    assert_eq!(count_of(&s2), 1);

    let after = engine.checkpoints().get("s1").await.unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.state.get("count"), Some(&json!(2)));
}

#[tokio::test]
async fn test_conversation_continues_across_runs() {
    let model = Arc::new(MockModel::new(vec![
        Message::assistant("first reply"),
        Message::assistant("second reply"),
    ]));
    let graph = chat_graph(model, vec![]).await;
    let engine = Engine::in_memory();

    engine.run(&graph, user_input("one"), "chat").await.unwrap();
    let state = engine.run(&graph, user_input("two"), "chat").await.unwrap();

    let contents: Vec<String> = state
        .messages()
        .unwrap()
        .iter()
        .map(|m| m.content())
        .collect();
    assert_eq!(contents, vec!["one", "first reply", "two", "second reply"]);
}

#[tokio::test]
async fn test_input_replaces_checkpointed_value() {
    let graph = counter_graph();
    let engine = Engine::in_memory();

    engine.run(&graph, WorkflowState::empty(), "s").await.unwrap();
    engine.run(&graph, WorkflowState::empty(), "s").await.unwrap();

    let reset = WorkflowState::empty().with("count", json!(100));
    let state = engine.run(&graph, reset, "s").await.unwrap();
    assert_eq!(count_of(&state), 101);
}

#[tokio::test]
async fn test_concurrent_runs_on_one_session_do_not_lose_updates() {
    let mut builder = GraphBuilder::new("slow-counter");
    builder
        .register_node(
            "increment",
            node_fn(|state: WorkflowState| async move {
                let n = count_of(&state);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, BoxError>(NodeResult::new().set("count", json!(n + 1)))
            }),
        )
        .unwrap()
        .set_entry("increment")
        .unwrap();
    let graph = Arc::new(builder.compile().unwrap());
    let engine = Engine::in_memory();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let graph = graph.clone();
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .run(&graph, WorkflowState::empty(), "shared")
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let checkpoint = engine.checkpoints().get("shared").await.unwrap().unwrap();
    assert_eq!(checkpoint.state.get("count"), Some(&json!(10)));
}

#[tokio::test]
async fn test_file_backend_survives_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let graph = counter_graph();

    for _ in 0..2 {
        let store = CheckpointStore::new(Arc::new(FileBackend::new(dir.path())));
        let engine = Engine::new(store);
        engine.run(&graph, WorkflowState::empty(), "user/42").await.unwrap();
    }

    let store = CheckpointStore::new(Arc::new(FileBackend::new(dir.path())));
    let checkpoint = store.get("user/42").await.unwrap().unwrap();
    assert_eq!(checkpoint.state.get("count"), Some(&json!(2)));

    assert!(store.evict("user/42").await.unwrap());
    assert!(store.get("user/42").await.unwrap().is_none());
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_unmapped_label_aborts_without_checkpoint() {
    let mut builder = GraphBuilder::new("router");
    builder
        .field("count", MergeStrategy::Replace, Some(json!(0)))
        .unwrap()
        .register_node(
            "increment",
            from_fn(|state| Ok(NodeResult::new().set("count", json!(count_of(state) + 1)))),
        )
        .unwrap()
        .add_conditional_edge(
            "increment",
            |state| {
                if count_of(state) > 1 {
                    "sideways".to_string()
                } else {
                    "done".to_string()
                }
            },
            [("done".to_string(), Target::End)],
        )
        .unwrap()
        .set_entry("increment")
        .unwrap();
    let graph = builder.compile().unwrap();
    let engine = Engine::in_memory();

    engine.run(&graph, WorkflowState::empty(), "s").await.unwrap();

    let err = engine
        .run(&graph, WorkflowState::empty(), "s")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RunError::Routing(RoutingError::UnmappedLabel {
            node: "increment".to_string(),
            label: "sideways".to_string(),
        })
    );

    let checkpoint = engine.checkpoints().get("s").await.unwrap().unwrap();
    assert_eq!(checkpoint.state.get("count"), Some(&json!(1)));
}

#[tokio::test]
async fn test_node_error_checkpoints_recovered_state() {
    let mut builder = GraphBuilder::new("failing");
    builder
        .register_node("fail", from_fn(|_| Err("model quota exceeded".into())))
        .unwrap()
        .set_entry("fail")
        .unwrap();
    let graph = builder.compile().unwrap();
    let engine = Engine::in_memory();

    let report = engine
        .execute(&graph, user_input("hi"), "s", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Recovered(ErrorCategory::Unclassified));
    assert!(report.checkpointed);

    let stored = engine
        .checkpoints()
        .get("s")
        .await
        .unwrap()
        .unwrap()
        .to_state(graph.schema().clone());
    assert!(stored.error_marker().is_none());
    assert_eq!(
        stored.last_message().unwrap().unwrap().content(),
        ErrorCategory::Unclassified.user_message()
    );
}

#[tokio::test]
async fn test_node_panic_is_recovered() {
    let mut builder = GraphBuilder::new("panicky");
    builder
        .register_node("boom", from_fn(|_| panic!("node exploded")))
        .unwrap()
        .set_entry("boom")
        .unwrap();
    let graph = builder.compile().unwrap();

    let report = Engine::in_memory()
        .execute(&graph, user_input("hi"), "s", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.visited, vec!["boom", "error"]);
    assert_eq!(report.outcome, RunOutcome::Recovered(ErrorCategory::Unclassified));
}

#[tokio::test]
async fn test_custom_error_node_does_not_wedge_the_session() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut builder = GraphBuilder::new("transient");
    builder
        .register_node(
            "work",
            from_fn(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient".into())
                } else {
                    Ok(NodeResult::new().set("done", json!(true)))
                }
            }),
        )
        .unwrap()
        .register_node("apology", Passthrough)
        .unwrap()
        .set_entry("work")
        .unwrap()
        .set_error_node("apology")
        .unwrap();
    let graph = builder.compile().unwrap();
    let engine = Engine::in_memory();

    let first = engine
        .execute(&graph, user_input("hi"), "s", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.visited, vec!["work", "apology"]);
    assert!(first.state.error_marker().is_none());

    let stored = engine.checkpoints().get("s").await.unwrap().unwrap();
    assert!(stored.state.get("error").map_or(true, Value::is_null));

    let second = engine
        .execute(&graph, user_input("again"), "s", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.visited, vec!["work"]);
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancelled_run_is_not_checkpointed() {
    let token = CancellationToken::new();
    let trigger = token.clone();

    let mut builder = GraphBuilder::new("cancel");
    builder
        .register_node(
            "first",
            from_fn(move |_| {
                trigger.cancel();
                Ok(NodeResult::new().set("touched", json!(true)))
            }),
        )
        .unwrap()
        .register_node("second", from_fn(|_| Ok(NodeResult::new())))
        .unwrap()
        .add_edge("first", "second")
        .unwrap()
        .set_entry("first")
        .unwrap();
    let graph = builder.compile().unwrap();
    let engine = Engine::in_memory();

    let err = engine
        .execute(&graph, WorkflowState::empty(), "s", &token)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Cancelled { .. }));
    assert!(engine.checkpoints().get("s").await.unwrap().is_none());
}

#[tokio::test]
async fn test_checkpoint_load_failure_is_recovered() {
    let backend = Arc::new(FlakyBackend {
        fail_get: true,
        ..Default::default()
    });
    let engine = Engine::new(CheckpointStore::new(backend.clone()));
    let graph = counter_graph();

    let report = engine
        .execute(&graph, WorkflowState::empty(), "s", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.visited, vec!["error"]);
    assert_eq!(
        report.outcome,
        RunOutcome::Recovered(ErrorCategory::PersistenceUnavailable)
    );
    assert!(!report.checkpointed);
    assert_eq!(backend.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_checkpoint_save_failure_still_returns_state() {
    let backend = Arc::new(FlakyBackend {
        fail_put: true,
        ..Default::default()
    });
    let engine = Engine::new(CheckpointStore::new(backend.clone()));

    let report = engine
        .execute(&counter_graph(), WorkflowState::empty(), "s", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(!report.checkpointed);
    assert_eq!(count_of(&report.state), 1);
    assert_eq!(backend.puts.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Coordinator
// ============================================================================

fn pipeline(forecast_runs: Arc<AtomicUsize>, alert_runs: Arc<AtomicUsize>) -> GraphDefinition {
    let mut builder = GraphBuilder::new("pipeline");
    Coordinator::new("coordinator")
        .stage(
            "forecast",
            "forecast_result",
            from_fn(move |_| {
                forecast_runs.fetch_add(1, Ordering::SeqCst);
                Ok(NodeResult::new().set("forecast_result", json!({"units": 120})))
            }),
        )
        .stage(
            "alerts",
            "alerts",
            from_fn(move |_| {
                alert_runs.fetch_add(1, Ordering::SeqCst);
                Ok(NodeResult::new().set("alerts", json!([])))
            }),
        )
        .install(&mut builder)
        .unwrap();
    builder.set_entry("coordinator").unwrap();
    builder.compile().unwrap()
}

#[tokio::test]
async fn test_coordinator_runs_each_stage_once() {
    let forecast_runs = Arc::new(AtomicUsize::new(0));
    let alert_runs = Arc::new(AtomicUsize::new(0));
    let graph = pipeline(forecast_runs.clone(), alert_runs.clone());
    let engine = Engine::in_memory();

    let report = engine
        .execute(&graph, WorkflowState::empty(), "p", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        report.visited,
        vec!["coordinator", "forecast", "coordinator", "alerts", "coordinator"]
    );
    assert_eq!(
        report.state.get(COMPLETED_STAGES),
        Some(&json!(["forecast", "alerts"]))
    );

    // Re-run from the checkpoint: nothing is recomputed, even the empty alert list
    let report = engine
        .execute(&graph, WorkflowState::empty(), "p", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.visited, vec!["coordinator"]);
    assert_eq!(forecast_runs.load(Ordering::SeqCst), 1);
    assert_eq!(alert_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_coordinator_skips_externally_supplied_stage() {
    let forecast_runs = Arc::new(AtomicUsize::new(0));
    let alert_runs = Arc::new(AtomicUsize::new(0));
    let graph = pipeline(forecast_runs.clone(), alert_runs.clone());

    let input = WorkflowState::empty().with("forecast_result", json!({"units": 7}));
    let state = Engine::in_memory().run(&graph, input, "p").await.unwrap();

    assert_eq!(forecast_runs.load(Ordering::SeqCst), 0);
    assert_eq!(alert_runs.load(Ordering::SeqCst), 1);
    assert_eq!(state.get("forecast_result"), Some(&json!({"units": 7})));
}

#[tokio::test]
async fn test_stage_that_never_populates_is_bounded() {
    let mut builder = GraphBuilder::new("stuck");
    Coordinator::new("coordinator")
        .stage("lazy", "result", from_fn(|_| Ok(NodeResult::new())))
        .install(&mut builder)
        .unwrap();
    builder.set_entry("coordinator").unwrap();
    let graph = builder.compile().unwrap();

    let report = Engine::in_memory()
        .with_max_iterations(6)
        .execute(&graph, WorkflowState::empty(), "s", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.iterations, 7);
    assert_eq!(
        report.outcome,
        RunOutcome::Recovered(ErrorCategory::BoundedIteration)
    );
}
