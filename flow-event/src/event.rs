//! Wire-level event types: run/step status, log events, stream messages.
//! Status-carrying variants use snake_case wire names; payloads are `serde_json::Value`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of one run. `Completed` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// True once the run can no longer change: `Completed` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Phase of one node execution recorded in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Start,
    End,
    Error,
}

/// One entry in a run's ordered log: node name, phase, timestamp, optional
/// payload (error detail on `Error` entries).
///
/// Append-only; ordering within a run is the execution order. Cross-run
/// ordering is unspecified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Node name this entry refers to.
    pub node: String,
    pub status: StepStatus,
    pub timestamp: DateTime<Utc>,
    /// Error detail for `Error` entries; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl LogEvent {
    /// Entry for a node about to be dispatched.
    pub fn start(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            status: StepStatus::Start,
            timestamp: Utc::now(),
            payload: None,
        }
    }

    /// Entry for a node that completed and had its delta merged.
    pub fn end(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            status: StepStatus::End,
            timestamp: Utc::now(),
            payload: None,
        }
    }

    /// Entry for a node whose dispatch failed; `detail` becomes the payload.
    pub fn error(node: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            status: StepStatus::Error,
            timestamp: Utc::now(),
            payload: Some(Value::String(detail.into())),
        }
    }
}

/// One message on a run's live stream: a log event as it is appended, or the
/// terminal marker carrying the final status. Subscribers stop after `Done`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Log(LogEvent),
    Done { status: RunStatus },
}
