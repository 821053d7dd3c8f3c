//! Tool abstraction and registry: named capabilities that transform state.
//!
//! The engine depends on the [`Tool`] seam instead of concrete functions;
//! asynchronous capabilities implement the trait directly, synchronous
//! closures are adapted with [`tool_fn`]. A capability receives the current
//! state read-only and returns a *partial* state for the engine to merge.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{StepError, ToolError};
use crate::state::State;

/// A named capability invoked by tool nodes.
///
/// `invoke` takes the current state and returns a partial state (the delta
/// to merge); any failure it raises is surfaced as a tool-execution failure
/// in the run log.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn invoke(&self, state: &State) -> Result<State, ToolError>;

    /// One-line description shown by [`ToolRegistry::list`].
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Adapter for synchronous closures: `tool_fn(|state| ...)`.
pub struct FnTool<F> {
    f: F,
    description: Option<String>,
}

impl<F> FnTool<F> {
    /// Attaches a one-line description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Wraps a synchronous closure as a [`Tool`].
pub fn tool_fn<F>(f: F) -> FnTool<F>
where
    F: Fn(&State) -> Result<State, ToolError> + Send + Sync,
{
    FnTool {
        f,
        description: None,
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&State) -> Result<State, ToolError> + Send + Sync,
{
    async fn invoke(&self, state: &State) -> Result<State, ToolError> {
        (self.f)(state)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Holds named capabilities; read-mostly after setup, safe for concurrent
/// invocation across runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a capability, overwriting any existing binding.
    pub fn register(&self, name: impl Into<String>, tool: Arc<dyn Tool>) {
        let name = name.into();
        tracing::debug!(tool = %name, "tool registered");
        self.tools.insert(name, tool);
    }

    /// Invokes the capability bound to `name` and returns its partial-state
    /// result. Fails with [`StepError::UnknownTool`] if absent; a failure
    /// raised by the capability becomes [`StepError::Tool`] carrying the
    /// original cause.
    pub async fn invoke(&self, name: &str, state: &State) -> Result<State, StepError> {
        let tool = self
            .tools
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StepError::UnknownTool(name.to_string()))?;
        tool.invoke(state).await.map_err(|source| StepError::Tool {
            tool: name.to_string(),
            source,
        })
    }

    /// Registered tool names with their descriptions, sorted by name.
    pub fn list(&self) -> Vec<(String, Option<String>)> {
        let mut tools: Vec<_> = self
            .tools
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().description().map(str::to_string),
                )
            })
            .collect();
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        tools
    }
}
