//! Run record: one execution of a graph, tracked by id and status.

use chrono::{DateTime, Utc};
use serde::Serialize;

use flow_event::{LogEvent, RunStatus, StepStatus};

use crate::state::State;

/// Snapshot of one run: identity, lifecycle status, current state, and the
/// ordered event log.
///
/// Owned by the run manager and mutated only by the run's controller;
/// readers receive clones, so a snapshot's state and log always belong
/// together. Frozen once the status is terminal.
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub graph_id: String,
    pub status: RunStatus,
    pub state: State,
    /// Node currently being executed; `None` once the run is terminal.
    pub current_node: Option<String>,
    pub log: Vec<LogEvent>,
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    pub(crate) fn new(
        run_id: impl Into<String>,
        graph_id: impl Into<String>,
        start_at: impl Into<String>,
        initial_state: State,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            graph_id: graph_id.into(),
            status: RunStatus::Pending,
            state: initial_state,
            current_node: Some(start_at.into()),
            log: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The failure detail of a failed run: the log's final `error` event.
    pub fn last_error(&self) -> Option<&LogEvent> {
        self.log
            .iter()
            .rev()
            .find(|event| event.status == StepStatus::Error)
    }
}
