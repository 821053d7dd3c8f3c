//! Engine error types.
//!
//! Split by propagation policy: [`ValidationError`] and [`EngineError`] are
//! structural and surface to the caller immediately; [`StepError`] is raised
//! while walking a graph and is captured into the run log instead of being
//! returned (the run ends with status `failed`).

use thiserror::Error;

use crate::graph::CompareOp;

/// Error when registering a graph definition (e.g. dangling reference,
/// duplicate node name). Fails at registration, never at run time.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Two nodes share the same name.
    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    /// `start_at` does not name a node in the graph.
    #[error("start_at references unknown node: {0}")]
    UnknownStartNode(String),

    /// A `next`/`on_true`/`on_false`/`body`/`after` reference names a node
    /// absent from the graph.
    #[error("node '{node}' field '{field}' references unknown node '{target}'")]
    UnknownReference {
        node: String,
        field: &'static str,
        target: String,
    },

    /// A loop node's `max_iterations` is zero.
    #[error("loop node '{0}' must allow at least one iteration")]
    ZeroIterationCap(String),
}

/// Caller-facing lookup and registration failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("graph not found: {0}")]
    GraphNotFound(String),

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Error raised by a tool capability; wraps the original cause.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ToolError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

impl ToolError {
    /// Tool error from a plain message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(msg.into().into())
    }
}

/// Runtime failure while executing one node.
///
/// Never returned to the run's caller: the controller records it as an
/// `error` log event, marks the run failed, and keeps the partial state and
/// log accumulated so far.
#[derive(Debug, Error)]
pub enum StepError {
    /// A tool node names a capability absent from the registry.
    #[error("tool not registered: {0}")]
    UnknownTool(String),

    /// The capability itself failed; carries the original cause.
    #[error("tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolError,
    },

    /// A conditional or loop node reads a key absent from the state.
    #[error("node '{node}' reads missing state key '{key}'")]
    MissingKey { node: String, key: String },

    /// Operand kinds differ, or the operator is not defined for the kind
    /// (ordering on booleans, null, arrays, objects).
    #[error("node '{node}' cannot apply '{op}' to {left} and {right} (key '{key}')")]
    TypeMismatch {
        node: String,
        key: String,
        op: CompareOp,
        left: &'static str,
        right: &'static str,
    },

    /// A loop gate was about to admit its body past `max_iterations`.
    #[error("loop node '{node}' exceeded {limit} iterations")]
    LoopLimitExceeded { node: String, limit: u32 },

    /// A pointer names a node absent from the graph. Unreachable for
    /// validated graphs; kept as a defensive check.
    #[error("node not found: {0}")]
    NodeNotFound(String),
}
