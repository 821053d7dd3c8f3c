//! Code-review workflow: a tool chain feeding a quality gate that cycles
//! through a refine step until the score clears the bar.
//!
//! Pipeline: extract -> complexity -> detect -> suggest -> quality_gate;
//! quality_gate routes to refine while quality_score < 0.8, and refine's
//! `next` edge re-enters the gate.

use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Value};

use flowgraph::{
    tool_fn, CompareOp, Engine, GraphDefinition, NodeDefinition, NodeKind, State, ToolError,
};

const SAMPLE: &str = r#"
fn categorize(values: &[i32]) -> (i32, i32) {
    let mut evens = 0;
    let mut odds = 0;
    for value in values {
        if value % 2 == 0 {
            evens += 1;
        } else if *value > 100 {
            odds += 2;
        } else {
            odds += 1;
        }
    }
    let mut index = 0;
    while index < values.len() {
        match values[index] {
            0 => evens += 1,
            _ => {
                if index % 3 == 0 {
                    odds += 1;
                }
            }
        }
        index += 1;
    }
    loop {
        if index == 0 {
            break;
        }
        index -= 1;
    }
    let summary = format!("categorized {} values into {} even and {} odd buckets for the final report", values.len(), evens, odds);
    // TODO: collapse the two passes into one
    (evens, odds)
}
"#;

fn delta(value: Value) -> State {
    value.as_object().expect("object literal").clone()
}

fn code_of(state: &State) -> &str {
    state.get("code").and_then(Value::as_str).unwrap_or("")
}

fn extract_functions(state: &State) -> Result<State, ToolError> {
    let re = Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)")
        .map_err(|e| ToolError::msg(e.to_string()))?;
    let functions: Vec<&str> = re
        .captures_iter(code_of(state))
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
        .collect();
    Ok(delta(json!({ "functions": functions })))
}

fn check_complexity(state: &State) -> Result<State, ToolError> {
    let branch_keywords = ["if ", "for ", "while ", "match ", "loop", "else"];
    let mut complexities: Vec<u32> = Vec::new();
    let mut current = 1u32;
    for line in code_of(state).lines().map(str::trim).filter(|l| !l.is_empty()) {
        if branch_keywords.iter().any(|kw| line.contains(kw)) {
            current += 1;
        }
        if line.starts_with("fn ") || line.starts_with("pub fn ") {
            complexities.push(current);
            current = 1;
        }
    }
    complexities.push(current);
    let avg = complexities.iter().sum::<u32>() as f64 / complexities.len() as f64;
    Ok(delta(json!({ "avg_complexity": (avg * 100.0).round() / 100.0 })))
}

fn detect_basic_issues(state: &State) -> Result<State, ToolError> {
    let code = code_of(state);
    let long_lines: Vec<usize> = code
        .lines()
        .enumerate()
        .filter(|(_, line)| line.len() > 100)
        .map(|(idx, _)| idx + 1)
        .collect();
    let todo_comments: Vec<usize> = code
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains("TODO"))
        .map(|(idx, _)| idx + 1)
        .collect();
    let mut issues = Vec::new();
    if !long_lines.is_empty() {
        issues.push(json!({"type": "long_lines", "lines": long_lines}));
    }
    if !todo_comments.is_empty() {
        issues.push(json!({"type": "todo_comments", "lines": todo_comments}));
    }
    Ok(delta(json!({ "issue_count": issues.len(), "issues": issues })))
}

fn suggest_improvements(state: &State) -> Result<State, ToolError> {
    let issues = state
        .get("issues")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let has = |kind: &str| issues.iter().any(|issue| issue["type"] == kind);
    let mut suggestions = Vec::new();
    if state
        .get("avg_complexity")
        .and_then(Value::as_f64)
        .unwrap_or(1.0)
        > 5.0
    {
        suggestions.push("Reduce branching or split functions to lower complexity.");
    }
    if has("long_lines") {
        suggestions.push("Wrap or refactor long lines to improve readability.");
    }
    if has("todo_comments") {
        suggestions.push("Resolve or track TODO comments explicitly.");
    }
    let score = (1.0 - 0.1 * suggestions.len() as f64).max(0.1);
    Ok(delta(json!({
        "suggestions": suggestions,
        "quality_score": (score * 100.0).round() / 100.0,
    })))
}

fn refine_suggestions(state: &State) -> Result<State, ToolError> {
    let mut suggestions = state
        .get("suggestions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    suggestions.push(json!("Apply one suggestion and re-evaluate quality."));
    let score = state
        .get("quality_score")
        .and_then(Value::as_f64)
        .unwrap_or(0.5);
    let new_score = (score + 0.1).min(1.0);
    Ok(delta(json!({
        "suggestions": suggestions,
        "quality_score": (new_score * 100.0).round() / 100.0,
    })))
}

fn tool(name: &str, tool: &str, next: Option<&str>) -> NodeDefinition {
    NodeDefinition {
        name: name.to_string(),
        kind: NodeKind::Tool {
            tool: tool.to_string(),
            next: next.map(str::to_string),
        },
    }
}

fn code_review_graph() -> GraphDefinition {
    GraphDefinition {
        graph_id: "code_review".to_string(),
        start_at: "extract".to_string(),
        nodes: vec![
            tool("extract", "extract_functions", Some("complexity")),
            tool("complexity", "check_complexity", Some("detect")),
            tool("detect", "detect_basic_issues", Some("suggest")),
            tool("suggest", "suggest_improvements", Some("quality_gate")),
            NodeDefinition {
                name: "quality_gate".to_string(),
                kind: NodeKind::Conditional {
                    key: "quality_score".to_string(),
                    op: CompareOp::Ge,
                    value: json!(0.8),
                    on_true: None,
                    on_false: Some("refine".to_string()),
                },
            },
            tool("refine", "refine_suggestions", Some("quality_gate")),
        ],
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Engine::new();
    engine.register_tool(
        "extract_functions",
        Arc::new(tool_fn(extract_functions).describe("List function names in the code")),
    );
    engine.register_tool(
        "check_complexity",
        Arc::new(tool_fn(check_complexity).describe("Average branching complexity per function")),
    );
    engine.register_tool(
        "detect_basic_issues",
        Arc::new(tool_fn(detect_basic_issues).describe("Long lines and TODO markers")),
    );
    engine.register_tool(
        "suggest_improvements",
        Arc::new(tool_fn(suggest_improvements).describe("Turn findings into suggestions")),
    );
    engine.register_tool(
        "refine_suggestions",
        Arc::new(tool_fn(refine_suggestions).describe("One refinement pass, bump the score")),
    );
    engine.register_graph(code_review_graph())?;

    let initial = delta(json!({ "code": SAMPLE }));
    let record = engine.start("code_review", initial, true).await?;

    println!("status: {:?}", record.status);
    println!("quality_score: {}", record.state["quality_score"]);
    println!("functions: {}", record.state["functions"]);
    if let Some(suggestions) = record.state["suggestions"].as_array() {
        println!("suggestions:");
        for suggestion in suggestions {
            println!("  - {}", suggestion.as_str().unwrap_or_default());
        }
    }
    println!("steps:");
    for event in &record.log {
        println!("  {:>5?}  {}", event.status, event.node);
    }
    Ok(())
}
