//! Run lifecycle: state merge through tools, failure capture, background
//! execution, and isolation between concurrent runs.

use std::sync::Arc;

use serde_json::{json, Value};

use flowgraph::{tool_fn, Engine, EngineError, RunStatus, State, StepStatus, ToolError};

use crate::common::{graph, register_increment, state_of, tool_node};

/// **Scenario**: A tool returning {"count": 1} from an empty initial state
/// yields final state {"count": 1} and a completed run.
#[tokio::test]
async fn tool_delta_merges_into_state() {
    let engine = Engine::new();
    engine.register_tool(
        "count",
        Arc::new(tool_fn(|_: &State| Ok(state_of(json!({"count": 1}))))),
    );
    engine
        .register_graph(graph("g", "only", vec![tool_node("only", "count", None)]))
        .unwrap();

    let record = engine.start("g", State::new(), true).await.unwrap();

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(Value::Object(record.state), json!({"count": 1}));
}

/// **Scenario**: Two tools writing the same key apply key-wise
/// last-write-wins across the chain.
#[tokio::test]
async fn chained_tools_overwrite_key_wise() {
    let engine = Engine::new();
    engine.register_tool(
        "first",
        Arc::new(tool_fn(|_: &State| Ok(state_of(json!({"a": 1}))))),
    );
    engine.register_tool(
        "second",
        Arc::new(tool_fn(|_: &State| Ok(state_of(json!({"a": 2, "b": 3}))))),
    );
    engine
        .register_graph(graph(
            "g",
            "one",
            vec![
                tool_node("one", "first", Some("two")),
                tool_node("two", "second", None),
            ],
        ))
        .unwrap();

    let record = engine.start("g", State::new(), true).await.unwrap();
    assert_eq!(Value::Object(record.state), json!({"a": 2, "b": 3}));
}

/// **Scenario**: A failing tool fails the run but preserves the state merged
/// before the failure and the log accumulated so far.
#[tokio::test]
async fn tool_failure_preserves_partial_state() {
    let engine = Engine::new();
    engine.register_tool(
        "seed",
        Arc::new(tool_fn(|_: &State| Ok(state_of(json!({"seeded": true}))))),
    );
    engine.register_tool(
        "boom",
        Arc::new(tool_fn(|_: &State| {
            Err(ToolError::msg("backend unavailable"))
        })),
    );
    engine
        .register_graph(graph(
            "g",
            "seed",
            vec![
                tool_node("seed", "seed", Some("explode")),
                tool_node("explode", "boom", None),
            ],
        ))
        .unwrap();

    let record = engine.start("g", State::new(), true).await.unwrap();

    assert_eq!(record.status, RunStatus::Failed);
    assert_eq!(record.state["seeded"], json!(true));
    let error = record.last_error().unwrap();
    assert_eq!(error.node, "explode");
    let detail = error.payload.as_ref().and_then(Value::as_str).unwrap();
    assert!(detail.contains("tool 'boom' failed"), "{}", detail);
    assert!(detail.contains("backend unavailable"), "{}", detail);
}

/// **Scenario**: An unbound tool name fails the run at the node that names it.
#[tokio::test]
async fn unknown_tool_fails_run() {
    let engine = Engine::new();
    engine
        .register_graph(graph("g", "only", vec![tool_node("only", "ghost", None)]))
        .unwrap();

    let record = engine.start("g", State::new(), true).await.unwrap();

    assert_eq!(record.status, RunStatus::Failed);
    let detail = record
        .last_error()
        .and_then(|event| event.payload.as_ref())
        .and_then(Value::as_str)
        .unwrap();
    assert!(detail.contains("tool not registered: ghost"), "{}", detail);
}

/// **Scenario**: Starting with wait_for_completion = false returns a pending
/// snapshot immediately; wait() then yields the completed record with the
/// full log.
#[tokio::test]
async fn background_run_is_pending_then_completed() {
    let engine = Engine::new();
    register_increment(&engine);
    engine
        .register_graph(graph("g", "only", vec![tool_node("only", "increment", None)]))
        .unwrap();

    let pending = engine.start("g", state_of(json!({"n": 0})), false).await.unwrap();
    assert_eq!(pending.status, RunStatus::Pending);
    assert!(pending.log.is_empty());

    let finished = engine.wait(&pending.run_id).await.unwrap();
    assert_eq!(finished.status, RunStatus::Completed);
    assert_eq!(finished.state["n"], json!(1));
    assert_eq!(finished.log.len(), 2);
    assert_eq!(finished.log[1].status, StepStatus::End);

    let queried = engine.get_state(&pending.run_id).await.unwrap();
    assert_eq!(queried.status, RunStatus::Completed);
}

/// **Scenario**: Two concurrent runs of the same graph with different
/// initial states never observe each other's state.
#[tokio::test]
async fn concurrent_runs_are_isolated() {
    let engine = Engine::new();
    register_increment(&engine);
    engine
        .register_graph(graph("g", "only", vec![tool_node("only", "increment", None)]))
        .unwrap();

    let a = engine.start("g", state_of(json!({"n": 1})), false).await.unwrap();
    let b = engine.start("g", state_of(json!({"n": 100})), false).await.unwrap();
    assert_ne!(a.run_id, b.run_id);

    let a = engine.wait(&a.run_id).await.unwrap();
    let b = engine.wait(&b.run_id).await.unwrap();
    assert_eq!(a.state["n"], json!(2));
    assert_eq!(b.state["n"], json!(101));
}

/// **Scenario**: Starting an unregistered graph fails with GraphNotFound
/// before any run is created.
#[tokio::test]
async fn unknown_graph_is_not_found() {
    let engine = Engine::new();
    match engine.start("ghost", State::new(), true).await {
        Err(EngineError::GraphNotFound(id)) => assert_eq!(id, "ghost"),
        other => panic!("expected GraphNotFound, got {:?}", other),
    }
}

/// **Scenario**: Querying an unknown run id fails with RunNotFound.
#[tokio::test]
async fn unknown_run_is_not_found() {
    let engine = Engine::new();
    match engine.get_state("no-such-run").await {
        Err(EngineError::RunNotFound(id)) => assert_eq!(id, "no-such-run"),
        other => panic!("expected RunNotFound, got {:?}", other),
    }
}
