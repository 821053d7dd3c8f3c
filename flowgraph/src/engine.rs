//! Engine context object: owns the graph store, the tool registry, and the
//! run table.
//!
//! Constructed once and passed explicitly to whatever needs it; no ambient
//! global state, so tests and embedders can hold disposable instances side
//! by side.

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;

use flow_event::Enveloped;

use crate::error::{EngineError, ValidationError};
use crate::graph::{GraphDefinition, GraphStore};
use crate::run::{RunManager, RunRecord};
use crate::state::State;
use crate::tools::{Tool, ToolRegistry};

/// The execution engine: graph store + tool registry + run manager.
pub struct Engine {
    graphs: Arc<GraphStore>,
    tools: Arc<ToolRegistry>,
    runs: RunManager,
}

impl Engine {
    /// Engine with an empty tool registry.
    pub fn new() -> Self {
        Self::with_registry(ToolRegistry::new())
    }

    /// Engine over a pre-populated tool registry.
    pub fn with_registry(tools: ToolRegistry) -> Self {
        let graphs = Arc::new(GraphStore::new());
        let tools = Arc::new(tools);
        Self {
            runs: RunManager::new(graphs.clone(), tools.clone()),
            graphs,
            tools,
        }
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.graphs
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn runs(&self) -> &RunManager {
        &self.runs
    }

    /// Validates and registers a graph definition.
    pub fn register_graph(&self, graph: GraphDefinition) -> Result<(), ValidationError> {
        self.graphs.register(graph)
    }

    /// Binds a named capability, overwriting any existing binding.
    pub fn register_tool(&self, name: impl Into<String>, tool: Arc<dyn Tool>) {
        self.tools.register(name, tool)
    }

    /// Starts a run; see [`RunManager::start`].
    pub async fn start(
        &self,
        graph_id: &str,
        initial_state: State,
        wait_for_completion: bool,
    ) -> Result<RunRecord, EngineError> {
        self.runs.start(graph_id, initial_state, wait_for_completion).await
    }

    /// Current snapshot of a run by id.
    pub async fn get_state(&self, run_id: &str) -> Result<RunRecord, EngineError> {
        self.runs.get_state(run_id).await
    }

    /// Awaits a run reaching a terminal status; returns the final record.
    pub async fn wait(&self, run_id: &str) -> Result<RunRecord, EngineError> {
        self.runs.wait(run_id).await
    }

    /// Live stream of a run's events, ending with the terminal marker.
    pub fn subscribe(&self, run_id: &str) -> Result<ReceiverStream<Enveloped>, EngineError> {
        self.runs.subscribe(run_id)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
