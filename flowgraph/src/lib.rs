//! flowgraph: execute declaratively defined node graphs over a shared,
//! incrementally merged key-value state.
//!
//! A graph is a set of named nodes (tool / conditional / loop) plus a start
//! node. Tool nodes invoke registry capabilities that return *partial*
//! states, merged key-wise into the run state; conditional and loop nodes
//! route on state values, with loops bounded by an explicit iteration cap.
//! Runs execute synchronously or as independent background tasks, each with
//! an ordered event log that can be streamed live.
//!
//! Entry point is [`Engine`]: register tools and graphs, start runs, query
//! snapshots, subscribe to event streams. Transports (HTTP, WebSocket, ...)
//! sit outside this crate and speak the `flow-event` wire types.

pub mod engine;
pub mod error;
pub mod graph;
pub mod run;
pub mod state;
pub mod tools;

mod executor;

pub use engine::Engine;
pub use error::{EngineError, StepError, ToolError, ValidationError};
pub use graph::{CompareOp, GraphDefinition, GraphStore, NodeDefinition, NodeKind};
pub use run::{RunManager, RunRecord, EVENT_QUEUE_CAPACITY};
pub use state::{merge, State};
pub use tools::{tool_fn, FnTool, Tool, ToolRegistry};

pub use flow_event::{EnvelopeState, Enveloped, LogEvent, RunStatus, StepStatus, StreamMessage};
