//! Graph and node definitions: the declarative data model plus structural
//! validation.
//!
//! A node's type-specific configuration is a closed tagged union
//! ([`NodeKind`]), serialized adjacently so the wire shape is
//! `{name, type, config: {...}}`. Validation runs once at registration;
//! dispatch never re-checks shapes.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Comparison operator used by conditional and loop gates.
///
/// Wire names are the literal operator tokens (`"=="`, `">="`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        };
        f.write_str(token)
    }
}

/// Type-specific node configuration.
///
/// References (`next`, `on_true`, `on_false`, `body`, `after`) are either
/// `None` (terminal) or the name of another node in the same graph; `body`
/// is always a node name. The loop body's own terminal edge must route back
/// to the loop node's name to re-enter the gate; the engine does not
/// auto-loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum NodeKind {
    /// Invoke a registry capability; merge its partial state; follow `next`.
    Tool {
        tool: String,
        #[serde(default)]
        next: Option<String>,
    },
    /// Compare `state[key] <op> value`; follow `on_true` or `on_false`.
    Conditional {
        key: String,
        op: CompareOp,
        value: Value,
        #[serde(default)]
        on_true: Option<String>,
        #[serde(default)]
        on_false: Option<String>,
    },
    /// Repeated gate: while the condition holds and the per-run counter is
    /// below `max_iterations`, enter `body`; once false, follow `after`.
    Loop {
        key: String,
        op: CompareOp,
        value: Value,
        body: String,
        #[serde(default)]
        after: Option<String>,
        max_iterations: u32,
    },
}

impl NodeKind {
    /// All node references this config carries, as (field, target) pairs.
    fn references(&self) -> Vec<(&'static str, &str)> {
        match self {
            NodeKind::Tool { next, .. } => {
                next.iter().map(|n| ("next", n.as_str())).collect()
            }
            NodeKind::Conditional {
                on_true, on_false, ..
            } => on_true
                .iter()
                .map(|n| ("on_true", n.as_str()))
                .chain(on_false.iter().map(|n| ("on_false", n.as_str())))
                .collect(),
            NodeKind::Loop { body, after, .. } => std::iter::once(("body", body.as_str()))
                .chain(after.iter().map(|n| ("after", n.as_str())))
                .collect(),
        }
    }
}

/// One node: unique name plus its tagged configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// A named, validated collection of nodes plus a start node.
///
/// Immutable after registration; replace by re-registering the same
/// `graph_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub graph_id: String,
    pub start_at: String,
    pub nodes: Vec<NodeDefinition>,
}

impl GraphDefinition {
    /// Checks the structural invariants: unique node names, `start_at`
    /// exists, every reference names an existing node, loop caps are
    /// positive. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut names = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(ValidationError::DuplicateNode(node.name.clone()));
            }
        }
        if !names.contains(self.start_at.as_str()) {
            return Err(ValidationError::UnknownStartNode(self.start_at.clone()));
        }
        for node in &self.nodes {
            for (field, target) in node.kind.references() {
                if !names.contains(target) {
                    return Err(ValidationError::UnknownReference {
                        node: node.name.clone(),
                        field,
                        target: target.to_string(),
                    });
                }
            }
            if let NodeKind::Loop {
                max_iterations: 0, ..
            } = node.kind
            {
                return Err(ValidationError::ZeroIterationCap(node.name.clone()));
            }
        }
        Ok(())
    }

    /// Looks up a node by name.
    pub fn node(&self, name: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.name == name)
    }
}
