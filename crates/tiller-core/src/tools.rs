//! Tool definition and output types.
//!
//! The schema half of the tool system: what a tool looks like to the LLM
//! and what its execution produces. The trait and registry live in the
//! tools crate; these types stay here so messages and events can reference
//! them without a dependency cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ToolResultContent;

/// JSON Schema-compatible parameter definition for a tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Top-level JSON Schema type.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property definitions (when type is `object`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Required property names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Description of the schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Catch-all for additional JSON Schema keywords.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterSchema {
    /// An `object` schema accepting any properties.
    #[must_use]
    pub fn any_object() -> Self {
        Self {
            schema_type: "object".into(),
            properties: None,
            required: None,
            description: None,
            extra: Map::new(),
        }
    }

    /// Render as a plain JSON value for validators.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// A tool definition that can be sent to the LLM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: ParameterSchema,
}

/// Output of a tool execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The tool output content.
    pub content: Vec<ToolResultContent>,
    /// Optional structured details (tool-specific metadata).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolOutput {
    /// Create a simple text output.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::text(text)],
            details: None,
        }
    }

    /// Attach a structured details payload.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Text blocks joined with newlines (images skipped).
    #[must_use]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ToolResultContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_def_serde_roundtrip() {
        let tool = ToolDef {
            name: "bash".into(),
            description: "Execute a shell command".into(),
            parameters: ParameterSchema {
                schema_type: "object".into(),
                properties: Some({
                    let mut m = Map::new();
                    let _ = m.insert("command".into(), json!({"type": "string"}));
                    m
                }),
                required: Some(vec!["command".into()]),
                description: None,
                extra: Map::new(),
            },
        };
        let json = serde_json::to_value(&tool).unwrap();
        let back: ToolDef = serde_json::from_value(json).unwrap();
        assert_eq!(tool, back);
    }

    #[test]
    fn any_object_schema() {
        let schema = ParameterSchema::any_object();
        assert_eq!(schema.schema_type, "object");
        assert!(schema.properties.is_none());
        assert_eq!(schema.to_value()["type"], "object");
    }

    #[test]
    fn schema_extra_keywords_flattened() {
        let schema = ParameterSchema {
            schema_type: "object".into(),
            properties: None,
            required: None,
            description: None,
            extra: {
                let mut m = Map::new();
                let _ = m.insert("additionalProperties".into(), json!(false));
                m
            },
        };
        let json = schema.to_value();
        assert_eq!(json["additionalProperties"], false);
    }

    #[test]
    fn output_text_helper() {
        let out = ToolOutput::text("echoed: x");
        assert_eq!(out.content.len(), 1);
        assert!(out.details.is_none());
        assert_eq!(out.text_content(), "echoed: x");
    }

    #[test]
    fn output_with_details() {
        let out = ToolOutput::text("ok").with_details(json!({"bytes": 42}));
        assert_eq!(out.details.unwrap()["bytes"], 42);
    }

    #[test]
    fn text_content_skips_images() {
        let out = ToolOutput {
            content: vec![
                ToolResultContent::text("caption"),
                ToolResultContent::image("data", "image/png"),
            ],
            details: None,
        };
        assert_eq!(out.text_content(), "caption");
    }
}
