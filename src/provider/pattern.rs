//! Schema-free completion variant — no LLM.
//!
//! Selects a tool by literal substring match ("use <tool>") and returns tool
//! results without paraphrasing. Used when no credential is available and as
//! the degraded mode after a failed provider initialization.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::provider::{
    render_raw_result, unresolved_selection, CompletionProvider, ToolSelection,
};
use crate::tools::ToolCatalog;
use crate::types::Result;

/// Provider variant that never calls a model.
#[derive(Debug)]
pub struct PatternProvider {
    default_tool: Option<String>,
    initialized: bool,
}

impl PatternProvider {
    pub fn new(default_tool: Option<String>) -> Self {
        Self {
            default_tool,
            initialized: false,
        }
    }
}

#[async_trait]
impl CompletionProvider for PatternProvider {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    async fn analyze_intent(&self, message: &str, catalog: &ToolCatalog)
        -> Result<ToolSelection> {
        // First catalog tool (name order) named after a literal "use " token.
        for tool in catalog.tools() {
            if message.contains(&format!("use {}", tool.name)) {
                let mut parameters = Map::new();
                parameters.insert("message".to_string(), Value::String(message.to_string()));
                return Ok(ToolSelection {
                    tool_name: tool.name.clone(),
                    reason: Some("explicit tool mention".to_string()),
                    parameters,
                });
            }
        }
        unresolved_selection(
            self.default_tool.as_deref(),
            catalog,
            message,
            "message names no tool",
        )
    }

    async fn generate_grounded_response(
        &self,
        _message: &str,
        _tool_name: &str,
        tool_result: &Value,
    ) -> String {
        render_raw_result(tool_result)
    }

    async fn close(&mut self) {
        self.initialized = false;
    }
}

// =============================================================================
// Tests
// =============================================================================
