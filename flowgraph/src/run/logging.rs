//! Structured logging for run execution events.

use crate::error::StepError;
use flow_event::RunStatus;

pub(crate) fn log_run_started(run_id: &str, graph_id: &str) {
    tracing::info!(run_id, graph_id, "run started");
}

pub(crate) fn log_node_start(run_id: &str, node: &str) {
    tracing::debug!(run_id, node, "node start");
}

pub(crate) fn log_node_end(run_id: &str, node: &str, next: Option<&str>) {
    tracing::debug!(run_id, node, next, "node end");
}

pub(crate) fn log_node_failed(run_id: &str, node: &str, error: &StepError) {
    tracing::error!(run_id, node, error = %error, "node failed");
}

pub(crate) fn log_run_finished(run_id: &str, status: RunStatus) {
    tracing::info!(run_id, ?status, "run finished");
}
