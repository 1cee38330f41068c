//! Declarative argument schemas — parsing and runtime validation.
//!
//! Tool hosts describe inputs with a JSON Schema subset. The subset is parsed
//! into [`Schema`]/[`SchemaNode`] once at catalog fetch; unrecognized kinds
//! degrade to `Any` rather than rejecting the tool. Validation is permissive:
//! properties the schema does not declare pass through untouched.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of a single schema property.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String,
    Number,
    Boolean,
    Object(Schema),
    Array(Box<SchemaNode>),
    /// Unrecognized or absent kind; accepts any value.
    Any,
}

impl SchemaNode {
    fn from_value(value: &Value) -> SchemaNode {
        match value.get("type").and_then(Value::as_str) {
            Some("string") => SchemaNode::String,
            Some("number") | Some("integer") => SchemaNode::Number,
            Some("boolean") => SchemaNode::Boolean,
            Some("object") => SchemaNode::Object(Schema::from_value(value).unwrap_or_default()),
            Some("array") => {
                let items = value
                    .get("items")
                    .map(SchemaNode::from_value)
                    .unwrap_or(SchemaNode::Any);
                SchemaNode::Array(Box::new(items))
            }
            _ => SchemaNode::Any,
        }
    }

    /// Validate a JSON value against this kind.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            SchemaNode::String => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("expected string, got {}", value_type_name(value)))
                }
            }
            SchemaNode::Number => {
                if value.is_number() {
                    Ok(())
                } else {
                    Err(format!("expected number, got {}", value_type_name(value)))
                }
            }
            SchemaNode::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("expected boolean, got {}", value_type_name(value)))
                }
            }
            SchemaNode::Object(inner) => match value.as_object() {
                Some(map) => inner
                    .check(map)
                    .map_err(|errors| errors.join("; ")),
                None => Err(format!("expected object, got {}", value_type_name(value))),
            },
            SchemaNode::Array(items) => match value.as_array() {
                Some(arr) => {
                    for (i, item) in arr.iter().enumerate() {
                        items
                            .validate(item)
                            .map_err(|e| format!("at index {}: {}", i, e))?;
                    }
                    Ok(())
                }
                None => Err(format!("expected array, got {}", value_type_name(value))),
            },
            SchemaNode::Any => Ok(()),
        }
    }

    /// Human-readable kind name for prompt signatures.
    pub fn display_name(&self) -> String {
        match self {
            SchemaNode::String => "string".to_string(),
            SchemaNode::Number => "number".to_string(),
            SchemaNode::Boolean => "boolean".to_string(),
            SchemaNode::Object(_) => "object".to_string(),
            SchemaNode::Array(items) => format!("{}[]", items.display_name()),
            SchemaNode::Any => "any".to_string(),
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declarative schema for a tool's argument object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Declared properties by name.
    pub properties: BTreeMap<String, SchemaNode>,
    /// Names that must be present; everything else is optional.
    pub required: BTreeSet<String>,
}

impl Schema {
    /// Parse the JSON Schema subset a tool host publishes as `inputSchema`.
    ///
    /// Returns `None` when the value is not an object (absent schema means
    /// any argument object is acceptable).
    pub fn from_value(value: &Value) -> Option<Schema> {
        let obj = value.as_object()?;

        let properties = obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, node)| (name.clone(), SchemaNode::from_value(node)))
                    .collect()
            })
            .unwrap_or_default();

        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(Schema {
            properties,
            required,
        })
    }

    /// Whether a property must be present.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Validate an argument object against this schema.
    ///
    /// Conforming candidates are accepted unchanged (the caller keeps the
    /// original map — no information loss). Returns every violation found,
    /// not just the first.
    pub fn check(&self, args: &Map<String, Value>) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for name in &self.required {
            if !args.contains_key(name) {
                errors.push(format!("missing required parameter: {}", name));
            }
        }

        for (key, value) in args {
            if let Some(node) = self.properties.get(key) {
                if let Err(e) = node.validate(value) {
                    errors.push(format!("parameter '{}': {}", key, e));
                }
            }
            // Undeclared properties pass through.
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render a compact `name: type` signature for prompt generation.
    ///
    /// Format: `city: string, days?: number`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .properties
            .iter()
            .map(|(name, node)| {
                let optional = if self.is_required(name) { "" } else { "?" };
                format!("{}{}: {}", name, optional, node.display_name())
            })
            .collect();
        params.join(", ")
    }
}

/// Minimal argument object used when validation fails.
///
/// Carries the original free-text message under a `message` key so the tool
/// still receives the user's intent; an empty message yields an empty object.
pub fn fallback_arguments(message: &str) -> Map<String, Value> {
    let mut args = Map::new();
    if !message.is_empty() {
        args.insert("message".to_string(), Value::String(message.to_string()));
    }
    args
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> Schema {
        Schema::from_value(&json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "days": {"type": "integer"},
                "detailed": {"type": "boolean"}
            },
            "required": ["city"]
        }))
        .unwrap()
    }

    #[test]
    fn parse_subset() {
        let schema = weather_schema();
        assert_eq!(schema.properties.len(), 3);
        assert_eq!(schema.properties["city"], SchemaNode::String);
        assert_eq!(schema.properties["days"], SchemaNode::Number);
        assert!(schema.is_required("city"));
        assert!(!schema.is_required("days"));
    }

    #[test]
    fn parse_non_object_is_none() {
        assert!(Schema::from_value(&json!(null)).is_none());
        assert!(Schema::from_value(&json!("string")).is_none());
    }

    #[test]
    fn unrecognized_kind_is_any() {
        let schema = Schema::from_value(&json!({
            "properties": {"blob": {"type": "binary"}}
        }))
        .unwrap();
        assert_eq!(schema.properties["blob"], SchemaNode::Any);
        // Any accepts everything
        assert!(schema.properties["blob"].validate(&json!({"a": 1})).is_ok());
        assert!(schema.properties["blob"].validate(&json!(null)).is_ok());
    }

    #[test]
    fn conforming_args_pass() {
        let schema = weather_schema();
        let args = json!({"city": "Lisbon", "days": 3})
            .as_object()
            .cloned()
            .unwrap();
        assert!(schema.check(&args).is_ok());
    }

    #[test]
    fn missing_required_fails() {
        let schema = weather_schema();
        let args = json!({"days": 3}).as_object().cloned().unwrap();
        let errors = schema.check(&args).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("missing required parameter: city"));
    }

    #[test]
    fn wrong_type_fails() {
        let schema = weather_schema();
        let args = json!({"city": 42}).as_object().cloned().unwrap();
        let errors = schema.check(&args).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("expected string, got number"));
    }

    #[test]
    fn undeclared_properties_pass_through() {
        let schema = weather_schema();
        let args = json!({"city": "Lisbon", "units": "metric"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(schema.check(&args).is_ok());
    }

    #[test]
    fn nested_object_validates_recursively() {
        let schema = Schema::from_value(&json!({
            "properties": {
                "location": {
                    "type": "object",
                    "properties": {"lat": {"type": "number"}, "lon": {"type": "number"}},
                    "required": ["lat", "lon"]
                }
            },
            "required": ["location"]
        }))
        .unwrap();

        let ok = json!({"location": {"lat": 38.7, "lon": -9.1}})
            .as_object()
            .cloned()
            .unwrap();
        assert!(schema.check(&ok).is_ok());

        let bad = json!({"location": {"lat": 38.7}}).as_object().cloned().unwrap();
        let errors = schema.check(&bad).unwrap_err();
        assert!(errors[0].contains("missing required parameter: lon"));
    }

    #[test]
    fn array_items_validate() {
        let schema = Schema::from_value(&json!({
            "properties": {
                "cities": {"type": "array", "items": {"type": "string"}}
            }
        }))
        .unwrap();

        let ok = json!({"cities": ["Lisbon", "Porto"]})
            .as_object()
            .cloned()
            .unwrap();
        assert!(schema.check(&ok).is_ok());

        let bad = json!({"cities": ["Lisbon", 2]}).as_object().cloned().unwrap();
        let errors = schema.check(&bad).unwrap_err();
        assert!(errors[0].contains("at index 1"));
    }

    #[test]
    fn signature_rendering() {
        let schema = weather_schema();
        assert_eq!(
            schema.signature(),
            "city: string, days?: number, detailed?: boolean"
        );
    }

    #[test]
    fn fallback_arguments_shape() {
        let args = fallback_arguments("what's the weather in Lisbon");
        assert_eq!(args.len(), 1);
        assert_eq!(args["message"], json!("what's the weather in Lisbon"));

        assert!(fallback_arguments("").is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        // Round-trip identity: any candidate conforming to the schema is
        // accepted as-is, with or without extra undeclared keys.
        proptest! {
            #[test]
            fn conforming_candidates_always_pass(
                city in ".*",
                days in proptest::option::of(any::<i64>()),
                extra in proptest::option::of(any::<bool>()),
            ) {
                let schema = weather_schema();
                let mut args = Map::new();
                args.insert("city".to_string(), Value::String(city));
                if let Some(days) = days {
                    args.insert("days".to_string(), json!(days));
                }
                if let Some(extra) = extra {
                    args.insert("unlisted".to_string(), json!(extra));
                }

                let before = args.clone();
                prop_assert!(schema.check(&args).is_ok());
                prop_assert_eq!(before, args);
            }
        }
    }
}
