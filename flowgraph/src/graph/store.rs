//! Graph store: validated definitions keyed by graph id.
//!
//! Read-mostly after setup; concurrent readers share `Arc` snapshots.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{EngineError, ValidationError};
use crate::graph::GraphDefinition;

/// Holds validated graph definitions keyed by `graph_id`.
///
/// Registration validates first and overwrites any previous definition with
/// the same id; definitions are immutable once stored.
#[derive(Default)]
pub struct GraphStore {
    graphs: DashMap<String, Arc<GraphDefinition>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a definition, replacing any previous one with
    /// the same `graph_id`.
    pub fn register(&self, graph: GraphDefinition) -> Result<(), ValidationError> {
        graph.validate()?;
        tracing::debug!(graph_id = %graph.graph_id, nodes = graph.nodes.len(), "graph registered");
        self.graphs.insert(graph.graph_id.clone(), Arc::new(graph));
        Ok(())
    }

    /// Returns the definition for `graph_id`.
    pub fn get(&self, graph_id: &str) -> Result<Arc<GraphDefinition>, EngineError> {
        self.graphs
            .get(graph_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::GraphNotFound(graph_id.to_string()))
    }

    /// Read-only snapshot of all registered definitions.
    pub fn list(&self) -> Vec<Arc<GraphDefinition>> {
        self.graphs.iter().map(|entry| entry.value().clone()).collect()
    }
}
