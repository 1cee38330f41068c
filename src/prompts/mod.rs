//! Prompt templates — pure string builders for the two generation requests.
//!
//! Two requests leave the agent: "which tool, with what arguments" and
//! "final answer grounded in this tool result". Both builders are side-effect
//! free; all catalog knowledge arrives through the tool list argument.

use serde_json::Value;

use crate::tools::Tool;

/// System instruction for the tool-selection request.
pub const TOOL_SELECTION_SYSTEM: &str = "You route user requests to tools. \
Respond with exactly one JSON object and nothing else.";

/// System instruction for the grounding request.
pub const GROUNDED_RESPONSE_SYSTEM: &str = "You answer user questions using \
only the tool data you are given. Do not invent facts.";

/// Build the tool-selection prompt.
///
/// Renders every tool's name, description, and argument signature, embeds the
/// user message, and instructs the model to answer with exactly one JSON
/// object naming one of the listed tools.
pub fn tool_selection_prompt(message: &str, tools: &[&Tool]) -> String {
    let mut lines = Vec::with_capacity(tools.len() + 8);
    lines.push("Available tools:".to_string());
    for tool in tools {
        lines.push(tool.to_prompt_line());
    }
    lines.push(String::new());
    lines.push(format!("User message: {}", message));
    lines.push(String::new());
    lines.push(
        "Pick the single best tool for this message. You must choose only from \
the tools listed above."
            .to_string(),
    );
    lines.push(
        "Respond with exactly one JSON object of the form \
{\"toolName\": \"...\", \"reason\": \"...\", \"parameters\": {...}} where \
parameters matches the tool's argument signature."
            .to_string(),
    );
    lines.join("\n")
}

/// Build the grounding prompt over a raw tool result.
///
/// The result is pretty-printed when structured and stringified otherwise, so
/// the model sees the same data the caller would.
pub fn grounded_response_prompt(message: &str, tool_name: &str, tool_result: &Value) -> String {
    let rendered = render_result(tool_result);
    format!(
        "User message: {message}\n\n\
The tool `{tool_name}` returned:\n{rendered}\n\n\
Answer the user's message directly and conversationally, grounded only in \
the data above. If the data is not sufficient to answer, say so explicitly."
    )
}

fn render_result(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================
