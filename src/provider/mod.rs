//! Completion provider abstraction.
//!
//! One capability set — initialize, analyze intent, ground a response, close —
//! with per-backend adapters sharing the prompt templates and JSON extraction.
//! [`LlmProvider`] speaks to a hosted model over HTTP; [`PatternProvider`] is
//! the schema-free variant used without credentials and as the degraded mode
//! after a failed provider initialization.

pub mod extract;
mod llm;
mod pattern;

pub use llm::LlmProvider;
pub use pattern::PatternProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::ToolCatalog;
use crate::types::{BackendKind, Error, LimitsConfig, ProviderConfig, Result};

/// One tool choice extracted from a user message.
///
/// Transient per message; `tool_name` must reference a catalog tool or the
/// selection is rejected before any host call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSelection {
    #[serde(rename = "toolName")]
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Capability set every completion backend implements.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Whether `initialize` has succeeded and `close` has not been called.
    fn is_initialized(&self) -> bool;

    /// Construct the backend client; resolves credentials exactly once.
    async fn initialize(&mut self) -> Result<()>;

    /// Decide which catalog tool (if any) satisfies the message.
    async fn analyze_intent(&self, message: &str, catalog: &ToolCatalog)
        -> Result<ToolSelection>;

    /// Produce the final answer grounded in the raw tool result.
    ///
    /// Never fails: backend trouble degrades to a string carrying the
    /// serialized tool result.
    async fn generate_grounded_response(
        &self,
        message: &str,
        tool_name: &str,
        tool_result: &Value,
    ) -> String;

    /// Release the backend client.
    async fn close(&mut self);
}

/// Build the configured provider variant.
pub fn build_provider(
    provider: &ProviderConfig,
    limits: &LimitsConfig,
) -> Box<dyn CompletionProvider> {
    match provider.backend {
        BackendKind::Pattern => Box::new(PatternProvider::new(provider.default_tool.clone())),
        BackendKind::Anthropic | BackendKind::OpenAi => {
            Box::new(LlmProvider::new(provider, limits))
        }
    }
}

/// Default-tool-or-error policy, shared by every variant.
///
/// A selection that could not be resolved (unparseable reply, missing fields,
/// unknown tool, no pattern match) falls back to the configured default tool
/// with the raw message as its sole parameter; with no default configured the
/// failure surfaces as [`Error::ToolSelection`].
pub(crate) fn unresolved_selection(
    default_tool: Option<&str>,
    catalog: &ToolCatalog,
    message: &str,
    cause: &str,
) -> Result<ToolSelection> {
    match default_tool {
        Some(name) if catalog.has_tool(name) => {
            tracing::warn!(tool = name, cause, "falling back to default tool");
            let mut parameters = Map::new();
            parameters.insert("message".to_string(), Value::String(message.to_string()));
            Ok(ToolSelection {
                tool_name: name.to_string(),
                reason: Some(format!("fallback: {}", cause)),
                parameters,
            })
        }
        Some(name) => Err(Error::tool_selection(format!(
            "{} (default tool '{}' not in catalog)",
            cause, name
        ))),
        None => Err(Error::tool_selection(cause.to_string())),
    }
}

/// Serialize a raw tool result for user-facing fallback output.
pub(crate) fn render_raw_result(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================
