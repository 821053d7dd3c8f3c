//! Run manager: creates runs, tracks their lifecycle, and answers queries.
//!
//! One controller task owns each run's record; status queries and stream
//! subscribers read concurrently through the per-record lock. Synchronous
//! starts drive the controller on the caller's task; background starts spawn
//! it as an independent unit of work.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{watch, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use flow_event::{Enveloped, RunStatus};

use crate::error::EngineError;
use crate::graph::GraphStore;
use crate::run::{LogEmitter, RunController, RunRecord};
use crate::state::State;
use crate::tools::ToolRegistry;

#[derive(Clone)]
struct RunHandle {
    record: Arc<RwLock<RunRecord>>,
    emitter: Arc<LogEmitter>,
    status_rx: watch::Receiver<RunStatus>,
}

/// Creates runs and tracks every in-flight and finished run of the engine.
pub struct RunManager {
    graphs: Arc<GraphStore>,
    tools: Arc<ToolRegistry>,
    runs: DashMap<String, RunHandle>,
}

impl RunManager {
    pub(crate) fn new(graphs: Arc<GraphStore>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            graphs,
            tools,
            runs: DashMap::new(),
        }
    }

    /// Starts a run of `graph_id` from `initial_state`.
    ///
    /// With `wait_for_completion` the controller runs on the current task
    /// and the final record is returned. Otherwise the controller is
    /// spawned as its own task and the pending snapshot is returned
    /// immediately; progress is observable via [`get_state`](Self::get_state),
    /// [`wait`](Self::wait), and [`subscribe`](Self::subscribe).
    pub async fn start(
        &self,
        graph_id: &str,
        initial_state: State,
        wait_for_completion: bool,
    ) -> Result<RunRecord, EngineError> {
        let graph = self.graphs.get(graph_id)?;
        let run_id = Uuid::new_v4().to_string();
        let record = RunRecord::new(&run_id, graph_id, &graph.start_at, initial_state);
        let pending = record.clone();

        let record = Arc::new(RwLock::new(record));
        let emitter = Arc::new(LogEmitter::new(&run_id, record.clone()));
        let (status_tx, status_rx) = watch::channel(RunStatus::Pending);
        self.runs.insert(
            run_id.clone(),
            RunHandle {
                record: record.clone(),
                emitter: emitter.clone(),
                status_rx,
            },
        );

        let controller = RunController {
            graph,
            tools: self.tools.clone(),
            record,
            emitter,
            status_tx,
        };
        if wait_for_completion {
            controller.drive().await;
            self.get_state(&run_id).await
        } else {
            tokio::spawn(controller.drive());
            Ok(pending)
        }
    }

    /// Current snapshot of a run, readable while it is still in progress.
    pub async fn get_state(&self, run_id: &str) -> Result<RunRecord, EngineError> {
        let record = self
            .runs
            .get(run_id)
            .map(|handle| handle.record.clone())
            .ok_or_else(|| EngineError::RunNotFound(run_id.to_string()))?;
        let snapshot = record.read().await.clone();
        Ok(snapshot)
    }

    /// Awaits a run reaching a terminal status, then returns the final record.
    pub async fn wait(&self, run_id: &str) -> Result<RunRecord, EngineError> {
        let mut status_rx = self
            .runs
            .get(run_id)
            .map(|handle| handle.status_rx.clone())
            .ok_or_else(|| EngineError::RunNotFound(run_id.to_string()))?;
        loop {
            if status_rx.borrow_and_update().is_terminal() {
                break;
            }
            if status_rx.changed().await.is_err() {
                break;
            }
        }
        self.get_state(run_id).await
    }

    /// Opens a live stream of the run's events; see [`LogEmitter`] for the
    /// subscription semantics.
    pub fn subscribe(&self, run_id: &str) -> Result<ReceiverStream<Enveloped>, EngineError> {
        let emitter = self
            .runs
            .get(run_id)
            .map(|handle| handle.emitter.clone())
            .ok_or_else(|| EngineError::RunNotFound(run_id.to_string()))?;
        Ok(emitter.subscribe())
    }
}
