//! Tool registry — the tool set available to a run.
//!
//! Tools are kept in registration order: [`ToolRegistry::definitions`]
//! presents them to the model exactly as the caller listed them, so the
//! schema section of the prompt stays stable across runs. Dispatch goes
//! through [`ToolRegistry::lookup`], which owns the unknown-tool error
//! the dispatcher records as a tool result.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use tiller_core::tools::ToolDef;

use crate::errors::ToolError;
use crate::traits::Tool;

/// The ordered tool set for one conversation.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools, preserving their order.
    #[must_use]
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::default();
        for tool in tools {
            registry.add(tool);
        }
        registry
    }

    /// Add a tool. A name collision replaces the earlier tool but keeps
    /// its position, so the schema order the model sees does not shift.
    pub fn add(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_owned();
        if let Some(&slot) = self.by_name.get(&name) {
            debug!(tool = %name, "tool replaced in registry");
            self.tools[slot] = tool;
        } else {
            debug!(tool = %name, "tool added to registry");
            let _ = self.by_name.insert(name, self.tools.len());
            self.tools.push(tool);
        }
    }

    /// Resolve a tool call's target by name.
    ///
    /// An unknown name yields the error the dispatcher turns into an
    /// error tool result for the model to observe.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.by_name
            .get(name)
            .map(|&slot| Arc::clone(&self.tools[slot]))
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_owned(),
            })
    }

    /// Tool schemas for the LLM, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use tiller_core::tools::{ParameterSchema, ToolOutput};

    use super::*;
    use crate::traits::ToolContext;

    struct StubTool {
        tool_name: String,
        version: &'static str,
    }

    impl StubTool {
        fn new(name: &str) -> Arc<dyn Tool> {
            Arc::new(Self {
                tool_name: name.into(),
                version: "v1",
            })
        }

        fn v2(name: &str) -> Arc<dyn Tool> {
            Arc::new(Self {
                tool_name: name.into(),
                version: "v2",
            })
        }
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            &self.tool_name
        }
        fn description(&self) -> &str {
            self.version
        }
        fn parameters(&self) -> ParameterSchema {
            ParameterSchema::any_object()
        }
        async fn execute(
            &self,
            _tool_call_id: &str,
            _args: Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("ok"))
        }
    }

    #[test]
    fn empty_registry_has_no_definitions() {
        let registry = ToolRegistry::new();
        assert!(registry.definitions().is_empty());
        assert!(registry.lookup("anything").is_err());
    }

    #[test]
    fn definitions_follow_registration_order() {
        let registry = ToolRegistry::from_tools(vec![
            StubTool::new("write"),
            StubTool::new("bash"),
            StubTool::new("read"),
        ]);
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["write", "bash", "read"]);
    }

    #[test]
    fn lookup_resolves_registered_tool() {
        let registry = ToolRegistry::from_tools(vec![StubTool::new("read")]);
        assert_eq!(registry.lookup("read").unwrap().name(), "read");
    }

    #[test]
    fn lookup_unknown_names_the_tool() {
        let registry = ToolRegistry::new();
        let err = registry.lookup("shell").unwrap_err();
        assert_eq!(err.to_string(), "Tool shell not found");
    }

    #[test]
    fn replacement_keeps_position() {
        let mut registry = ToolRegistry::from_tools(vec![
            StubTool::new("read"),
            StubTool::new("write"),
        ]);
        registry.add(StubTool::v2("read"));

        // Still two tools, "read" still first, but now the replacement.
        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "read");
        assert_eq!(defs[0].description, "v2");
        assert_eq!(registry.lookup("read").unwrap().description(), "v2");
    }
}
