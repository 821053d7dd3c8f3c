//! Live streaming: ordered enveloped events, the terminal marker, and late
//! subscription.

use std::sync::Arc;

use serde_json::json;
use tokio_stream::StreamExt;

use flowgraph::{Engine, RunStatus, State, StepStatus, StreamMessage};

use crate::common::{graph, state_of, tool_node, GatedTool};

/// **Scenario**: A subscriber opened before the run progresses sees every
/// event in append order with increasing seq, then Done(completed), then the
/// stream ends.
#[tokio::test]
async fn subscriber_streams_run_to_terminal_marker() {
    let engine = Engine::new();
    let (release, gated) = GatedTool::new();
    engine.register_tool("gated", Arc::new(gated));
    engine
        .register_graph(graph("g", "only", vec![tool_node("only", "gated", None)]))
        .unwrap();

    let pending = engine.start("g", State::new(), false).await.unwrap();
    let mut stream = engine.subscribe(&pending.run_id).unwrap();
    release.notify_one();

    let mut messages = Vec::new();
    while let Some(enveloped) = stream.next().await {
        assert_eq!(enveloped.run_id, pending.run_id);
        messages.push(enveloped);
    }

    assert!(
        messages.windows(2).all(|w| w[0].seq < w[1].seq),
        "seq must increase: {:?}",
        messages.iter().map(|m| m.seq).collect::<Vec<_>>()
    );
    let (last, events) = messages.split_last().unwrap();
    match last.message {
        StreamMessage::Done { status } => assert_eq!(status, RunStatus::Completed),
        ref other => panic!("expected Done, got {:?}", other),
    }
    let statuses: Vec<_> = events
        .iter()
        .map(|m| match &m.message {
            StreamMessage::Log(event) => event.status,
            other => panic!("expected Log, got {:?}", other),
        })
        .collect();
    assert_eq!(statuses, vec![StepStatus::Start, StepStatus::End]);
}

/// **Scenario**: Subscribing after the run finished yields only the terminal
/// marker; earlier events are available via the stored log.
#[tokio::test]
async fn late_subscriber_gets_only_terminal_marker() {
    let engine = Engine::new();
    engine.register_tool(
        "noop",
        Arc::new(flowgraph::tool_fn(|_: &State| Ok(State::new()))),
    );
    engine
        .register_graph(graph("g", "only", vec![tool_node("only", "noop", None)]))
        .unwrap();

    let record = engine
        .start("g", state_of(json!({"x": 1})), true)
        .await
        .unwrap();
    assert_eq!(record.status, RunStatus::Completed);

    let mut stream = engine.subscribe(&record.run_id).unwrap();
    match stream.next().await.unwrap().message {
        StreamMessage::Done { status } => assert_eq!(status, RunStatus::Completed),
        other => panic!("expected Done, got {:?}", other),
    }
    assert!(stream.next().await.is_none());

    let stored = engine.get_state(&record.run_id).await.unwrap();
    assert_eq!(stored.log.len(), 2);
}
