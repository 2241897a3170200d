//! Schema construction and argument validation.
//!
//! [`SchemaBuilder`] declares a tool's parameters as an ordered list of
//! named entries and renders them into a JSON-Schema object at build
//! time. [`validate_arguments`] checks a tool call's arguments against
//! the declared schema before the tool runs.

use serde_json::{Map, Value};

use tiller_core::tools::ParameterSchema;

use crate::errors::ToolError;

/// One declared parameter.
struct Param {
    name: String,
    schema: Value,
    required: bool,
}

/// Builder for tool parameter schemas.
///
/// ```ignore
/// SchemaBuilder::object()
///     .required("value", json!({"type": "string", "description": "Value to echo"}))
///     .optional("repeat", json!({"type": "integer"}))
///     .build()
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    params: Vec<Param>,
    description: Option<String>,
}

impl SchemaBuilder {
    /// Start building an `object` schema.
    #[must_use]
    pub fn object() -> Self {
        Self::default()
    }

    /// Declare a required parameter.
    #[must_use]
    pub fn required(mut self, name: &str, schema: Value) -> Self {
        self.params.push(Param {
            name: name.into(),
            schema,
            required: true,
        });
        self
    }

    /// Declare an optional parameter.
    #[must_use]
    pub fn optional(mut self, name: &str, schema: Value) -> Self {
        self.params.push(Param {
            name: name.into(),
            schema,
            required: false,
        });
        self
    }

    /// Set the schema description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render the declared parameters into a [`ParameterSchema`].
    ///
    /// A later declaration of the same name wins; required-ness follows
    /// the winning declaration.
    #[must_use]
    pub fn build(self) -> ParameterSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            if param.required && !required.contains(&param.name) {
                required.push(param.name.clone());
            } else if !param.required {
                required.retain(|name| *name != param.name);
            }
            let _ = properties.insert(param.name, param.schema);
        }

        ParameterSchema {
            schema_type: "object".into(),
            properties: (!properties.is_empty()).then_some(properties),
            required: (!required.is_empty()).then_some(required),
            description: self.description,
            extra: Map::new(),
        }
    }
}

/// Validate tool arguments against the declared parameter schema.
///
/// All validator errors are joined into one message so the model sees the
/// full picture in a single error result.
pub fn validate_arguments(schema: &ParameterSchema, args: &Value) -> Result<(), ToolError> {
    let schema_value = schema.to_value();
    let validator = jsonschema::validator_for(&schema_value).map_err(|e| ToolError::Internal {
        message: format!("invalid tool schema: {e}"),
    })?;
    if validator.is_valid(args) {
        return Ok(());
    }
    let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
    Err(ToolError::Validation {
        message: errors.join("; "),
    })
}
