//! Background run with live streaming: start a graph without waiting,
//! subscribe to its event stream, print enveloped messages until the
//! terminal marker, then query the final record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_stream::StreamExt;

use flowgraph::{
    CompareOp, Engine, GraphDefinition, NodeDefinition, NodeKind, State, Tool, ToolError,
};

/// Asynchronous capability: waits a beat, then advances the tick counter.
struct TickTool;

#[async_trait]
impl Tool for TickTool {
    async fn invoke(&self, state: &State) -> Result<State, ToolError> {
        tokio::time::sleep(Duration::from_millis(25)).await;
        let ticks = state.get("ticks").and_then(Value::as_i64).unwrap_or(0);
        let mut delta = State::new();
        delta.insert("ticks".to_string(), json!(ticks + 1));
        Ok(delta)
    }

    fn description(&self) -> Option<&str> {
        Some("Sleep briefly and increment the tick counter")
    }
}

fn ticker_graph() -> GraphDefinition {
    GraphDefinition {
        graph_id: "ticker".to_string(),
        start_at: "gate".to_string(),
        nodes: vec![
            NodeDefinition {
                name: "gate".to_string(),
                kind: NodeKind::Loop {
                    key: "ticks".to_string(),
                    op: CompareOp::Lt,
                    value: json!(3),
                    body: "tick".to_string(),
                    after: None,
                    max_iterations: 10,
                },
            },
            NodeDefinition {
                name: "tick".to_string(),
                kind: NodeKind::Tool {
                    tool: "tick".to_string(),
                    next: Some("gate".to_string()),
                },
            },
        ],
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Engine::new();
    engine.register_tool("tick", Arc::new(TickTool));
    engine.register_graph(ticker_graph())?;

    let mut initial = State::new();
    initial.insert("ticks".to_string(), json!(0));
    let pending = engine.start("ticker", initial, false).await?;
    println!("started run {} ({:?})", pending.run_id, pending.status);

    let mut stream = engine.subscribe(&pending.run_id)?;
    while let Some(enveloped) = stream.next().await {
        println!("{}", serde_json::to_string(&enveloped)?);
    }

    let record = engine.get_state(&pending.run_id).await?;
    println!(
        "finished {:?} with ticks = {} after {} log events",
        record.status,
        record.state["ticks"],
        record.log.len()
    );
    Ok(())
}
