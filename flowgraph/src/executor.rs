//! Single-node dispatch: tool, conditional, and loop nodes.
//!
//! [`execute_node`] is a function of (node, state, registry, loop counters)
//! returning the state delta to merge and the next pointer (`None` ends the
//! run). Conditionals and loops never mutate state; only tool nodes produce
//! a non-empty delta.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::StepError;
use crate::graph::{CompareOp, NodeDefinition, NodeKind};
use crate::state::State;
use crate::tools::ToolRegistry;

/// JSON kind name used in comparison error messages.
fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Type-aware comparison: numbers numerically, strings lexically, booleans
/// and null by identity (equality only). Operand kinds that differ, and
/// ordering on kinds without an order, fail with [`StepError::TypeMismatch`].
fn compare(
    node: &str,
    key: &str,
    left: &Value,
    op: CompareOp,
    right: &Value,
) -> Result<bool, StepError> {
    use CompareOp::*;
    let mismatch = || StepError::TypeMismatch {
        node: node.to_string(),
        key: key.to_string(),
        op,
        left: kind_name(left),
        right: kind_name(right),
    };
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Ok(match op {
                Eq => a == b,
                Ne => a != b,
                Gt => a > b,
                Ge => a >= b,
                Lt => a < b,
                Le => a <= b,
            }),
            _ => Err(mismatch()),
        },
        (Value::String(a), Value::String(b)) => Ok(match op {
            Eq => a == b,
            Ne => a != b,
            Gt => a > b,
            Ge => a >= b,
            Lt => a < b,
            Le => a <= b,
        }),
        (Value::Bool(a), Value::Bool(b)) => match op {
            Eq => Ok(a == b),
            Ne => Ok(a != b),
            _ => Err(mismatch()),
        },
        (Value::Null, Value::Null) => match op {
            Eq => Ok(true),
            Ne => Ok(false),
            _ => Err(mismatch()),
        },
        _ => Err(mismatch()),
    }
}

/// Reads the gate operand from state; absent keys fail fast rather than
/// comparing as false, so authoring mistakes surface immediately.
fn gate_operand<'a>(node: &str, key: &str, state: &'a State) -> Result<&'a Value, StepError> {
    state.get(key).ok_or_else(|| StepError::MissingKey {
        node: node.to_string(),
        key: key.to_string(),
    })
}

/// Dispatches one node against the current state.
///
/// Returns `(delta, next pointer)`. `loop_counts` holds the per-run
/// iteration counter for each loop node, keyed by node name; the counter is
/// discarded when the loop's condition turns false.
pub(crate) async fn execute_node(
    node: &NodeDefinition,
    state: &State,
    tools: &ToolRegistry,
    loop_counts: &mut HashMap<String, u32>,
) -> Result<(State, Option<String>), StepError> {
    match &node.kind {
        NodeKind::Tool { tool, next } => {
            let delta = tools.invoke(tool, state).await?;
            Ok((delta, next.clone()))
        }
        NodeKind::Conditional {
            key,
            op,
            value,
            on_true,
            on_false,
        } => {
            let operand = gate_operand(&node.name, key, state)?;
            let passed = compare(&node.name, key, operand, *op, value)?;
            let next = if passed { on_true } else { on_false };
            Ok((State::new(), next.clone()))
        }
        NodeKind::Loop {
            key,
            op,
            value,
            body,
            after,
            max_iterations,
        } => {
            let operand = gate_operand(&node.name, key, state)?;
            if compare(&node.name, key, operand, *op, value)? {
                let count = loop_counts.entry(node.name.clone()).or_insert(0);
                if *count >= *max_iterations {
                    return Err(StepError::LoopLimitExceeded {
                        node: node.name.clone(),
                        limit: *max_iterations,
                    });
                }
                *count += 1;
                Ok((State::new(), Some(body.clone())))
            } else {
                loop_counts.remove(&node.name);
                Ok((State::new(), after.clone()))
            }
        }
    }
}
