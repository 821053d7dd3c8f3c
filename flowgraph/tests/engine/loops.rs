//! Loop gates: bounded repetition, body re-entry via the body's own terminal
//! edge, and the iteration cap as a hard failure.

use std::sync::atomic::Ordering;

use serde_json::json;

use flowgraph::{CompareOp, Engine, RunStatus, StepStatus};

use crate::common::{graph, loop_node, register_increment, state_of, tool_node};

/// **Scenario**: gate(n < 3) -> work(n += 1) -> gate terminates once the
/// condition turns false; the body ran exactly three times.
#[tokio::test]
async fn loop_terminates_when_condition_turns_false() {
    let engine = Engine::new();
    let calls = register_increment(&engine);
    engine
        .register_graph(graph(
            "g",
            "gate",
            vec![
                loop_node("gate", "n", CompareOp::Lt, json!(3), "work", None, 10),
                tool_node("work", "increment", Some("gate")),
            ],
        ))
        .unwrap();

    let record = engine.start("g", state_of(json!({"n": 0})), true).await.unwrap();

    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.state["n"], json!(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// **Scenario**: A condition that never turns false with max_iterations = 3
/// fails the run after exactly 3 body executions — not 2, not 4 — and the
/// final error event names the loop node.
#[tokio::test]
async fn loop_cap_fails_run_after_exact_iterations() {
    let engine = Engine::new();
    let calls = register_increment(&engine);
    engine
        .register_graph(graph(
            "g",
            "gate",
            vec![
                // Gate watches a key the body never touches.
                loop_node("gate", "again", CompareOp::Eq, json!(true), "work", None, 3),
                tool_node("work", "increment", Some("gate")),
            ],
        ))
        .unwrap();

    let record = engine
        .start("g", state_of(json!({"again": true, "n": 0})), true)
        .await
        .unwrap();

    assert_eq!(record.status, RunStatus::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(record.state["n"], json!(3), "merged state survives the failure");

    let error = record.last_error().unwrap();
    assert_eq!(error.node, "gate");
    let detail = error.payload.as_ref().and_then(serde_json::Value::as_str).unwrap();
    assert!(detail.contains("exceeded 3 iterations"), "{}", detail);
}

/// **Scenario**: A gate that is false on first visit goes straight to after.
#[tokio::test]
async fn false_gate_skips_body() {
    let engine = Engine::new();
    let calls = register_increment(&engine);
    engine
        .register_graph(graph(
            "g",
            "gate",
            vec![
                loop_node("gate", "n", CompareOp::Lt, json!(0), "work", Some("done"), 5),
                tool_node("work", "increment", Some("gate")),
                tool_node("done", "increment", None),
            ],
        ))
        .unwrap();

    let record = engine.start("g", state_of(json!({"n": 7})), true).await.unwrap();

    assert_eq!(record.status, RunStatus::Completed);
    // Only the after-node ran.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(record.state["n"], json!(8));
    let first_end = record
        .log
        .iter()
        .find(|event| event.status == StepStatus::End)
        .unwrap();
    assert_eq!(first_end.node, "gate");
}
