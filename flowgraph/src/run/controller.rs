//! Run controller: drives one run from start_at to a terminal status.
//!
//! Strictly sequential within a run; each step looks up the node, emits a
//! `start` event, dispatches, merges the delta, emits `end`, and advances.
//! Any step failure is recorded as an `error` event and fails the run; no
//! retry, no rollback of already-merged state. A cancellation token, if ever
//! added, would be checked at the step boundary.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use flow_event::{LogEvent, RunStatus};

use crate::error::StepError;
use crate::executor::execute_node;
use crate::graph::{GraphDefinition, NodeDefinition};
use crate::run::logging::{
    log_node_end, log_node_failed, log_node_start, log_run_finished, log_run_started,
};
use crate::run::{LogEmitter, RunRecord};
use crate::state::merge;
use crate::tools::ToolRegistry;

pub(crate) struct RunController {
    pub(crate) graph: Arc<GraphDefinition>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) record: Arc<RwLock<RunRecord>>,
    pub(crate) emitter: Arc<LogEmitter>,
    pub(crate) status_tx: watch::Sender<RunStatus>,
}

impl RunController {
    /// Walks the graph to completion, updating the record in place.
    pub(crate) async fn drive(self) {
        let run_id = {
            let mut record = self.record.write().await;
            record.status = RunStatus::Running;
            record.run_id.clone()
        };
        self.status_tx.send_replace(RunStatus::Running);
        log_run_started(&run_id, &self.graph.graph_id);

        let nodes: HashMap<&str, &NodeDefinition> = self
            .graph
            .nodes
            .iter()
            .map(|node| (node.name.as_str(), node))
            .collect();
        let mut loop_counts: HashMap<String, u32> = HashMap::new();
        let mut pointer = Some(self.graph.start_at.clone());

        while let Some(name) = pointer {
            let Some(node) = nodes.get(name.as_str()) else {
                // Unreachable for validated graphs; recorded, not panicked.
                self.fail(&run_id, &name, StepError::NodeNotFound(name.clone()))
                    .await;
                return;
            };
            self.record.write().await.current_node = Some(name.clone());
            self.emitter.append(LogEvent::start(&name)).await;
            log_node_start(&run_id, &name);

            let state = self.record.read().await.state.clone();
            match execute_node(node, &state, &self.tools, &mut loop_counts).await {
                Ok((delta, next)) => {
                    if !delta.is_empty() {
                        merge(&mut self.record.write().await.state, delta);
                    }
                    self.emitter.append(LogEvent::end(&name)).await;
                    log_node_end(&run_id, &name, next.as_deref());
                    pointer = next;
                }
                Err(error) => {
                    self.fail(&run_id, &name, error).await;
                    return;
                }
            }
        }

        {
            let mut record = self.record.write().await;
            record.status = RunStatus::Completed;
            record.current_node = None;
        }
        self.status_tx.send_replace(RunStatus::Completed);
        self.emitter.finish(RunStatus::Completed);
        log_run_finished(&run_id, RunStatus::Completed);
    }

    /// Records the failure and freezes the run; partial state and the log
    /// accumulated so far are preserved.
    async fn fail(&self, run_id: &str, node: &str, error: StepError) {
        log_node_failed(run_id, node, &error);
        self.emitter
            .append(LogEvent::error(node, error.to_string()))
            .await;
        {
            let mut record = self.record.write().await;
            record.status = RunStatus::Failed;
            record.current_node = None;
        }
        self.status_tx.send_replace(RunStatus::Failed);
        self.emitter.finish(RunStatus::Failed);
        log_run_finished(run_id, RunStatus::Failed);
    }
}
