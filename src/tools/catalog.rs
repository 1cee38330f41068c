//! Tool catalog — typed metadata fetched from the tool host.
//!
//! Owns tool *metadata* (not implementations — the host keeps the
//! executables). The catalog is snapshotted once at agent initialization and
//! never refreshed mid-session.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::tools::schema::Schema;
use crate::types::Error;

/// One remote tool as published by the host's `tools/list`.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub description: Option<String>,
    /// Declared argument schema; `None` means any argument object is accepted.
    pub input_schema: Option<Schema>,
}

impl Tool {
    /// Parse one `tools/list` entry. Returns `None` when the entry has no name.
    pub fn from_listing(value: &Value) -> Option<Tool> {
        let name = value.get("name")?.as_str()?;
        if name.is_empty() {
            return None;
        }
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);
        let input_schema = value.get("inputSchema").and_then(Schema::from_value);
        Some(Tool {
            name: name.to_string(),
            description,
            input_schema,
        })
    }

    /// Generate a prompt line for this tool.
    ///
    /// Format: `- tool_name(param: type, other?: type): description`
    pub fn to_prompt_line(&self) -> String {
        let params = self
            .input_schema
            .as_ref()
            .map(Schema::signature)
            .unwrap_or_default();
        let description = self.description.as_deref().unwrap_or("(no description)");
        format!("- {}({}): {}", self.name, params, description)
    }
}

/// In-memory tool catalog. Immutable snapshot of one host's tools.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    entries: BTreeMap<String, Tool>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build a catalog from raw `tools/list` entries.
    ///
    /// Entries without a usable name are skipped rather than failing the
    /// whole listing.
    pub fn from_listing(values: &[Value]) -> Self {
        let mut catalog = Self::new();
        for value in values {
            if let Some(tool) = Tool::from_listing(value) {
                catalog.entries.insert(tool.name.clone(), tool);
            } else {
                tracing::warn!("skipping tool listing entry without a name");
            }
        }
        catalog
    }

    /// Build a catalog from already-parsed tools.
    pub fn from_tools(tools: Vec<Tool>) -> Self {
        let mut catalog = Self::new();
        for tool in tools {
            if tool.name.is_empty() {
                tracing::warn!("skipping tool with empty name");
                continue;
            }
            catalog.entries.insert(tool.name.clone(), tool);
        }
        catalog
    }

    /// Register a tool entry.
    pub fn register(&mut self, tool: Tool) -> crate::types::Result<()> {
        if tool.name.is_empty() {
            return Err(Error::validation("tool name cannot be empty"));
        }
        self.entries.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.entries.get(name)
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All tools in name order.
    pub fn tools(&self) -> Vec<&Tool> {
        self.entries.values().collect()
    }

    /// All tool names in order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
