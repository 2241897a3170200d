//! The tool trait and its execution context.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tiller_core::tools::{ParameterSchema, ToolDef, ToolOutput};

use crate::errors::ToolError;

// ─────────────────────────────────────────────────────────────────────────────
// Tool context
// ─────────────────────────────────────────────────────────────────────────────

/// Sender for intermediate tool output.
///
/// Each send becomes a `tool_execution_update` event on the run's stream.
/// Sends after the listener is gone are silently dropped.
#[derive(Clone, Debug)]
pub struct UpdateSender {
    tx: mpsc::UnboundedSender<ToolOutput>,
}

impl UpdateSender {
    /// Wrap an update channel sender.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ToolOutput>) -> Self {
        Self { tx }
    }

    /// An update sender with no listener.
    #[must_use]
    pub fn disabled() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    /// Report intermediate output.
    pub fn send(&self, partial: ToolOutput) {
        let _ = self.tx.send(partial);
    }
}

/// Execution context passed to every tool invocation.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Cooperative cancellation. Tools should observe this and return
    /// promptly; the engine never force-kills an execution.
    pub cancel: CancellationToken,
    /// Channel for intermediate output.
    pub updates: UpdateSender,
}

impl ToolContext {
    /// A context with no cancellation pending and no update listener.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            cancel: CancellationToken::new(),
            updates: UpdateSender::disabled(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────────────────────────────────────

/// The trait every tool implements.
///
/// Each tool provides a schema (sent to the LLM) and an async `execute`.
/// Errors returned from `execute` are recorded as error tool results, not
/// propagated.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name — the exact string sent to/from the LLM.
    fn name(&self) -> &str;

    /// Short human-readable label for UIs.
    fn label(&self) -> &str {
        self.name()
    }

    /// Human-readable description sent to the LLM.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn parameters(&self) -> ParameterSchema;

    /// The [`ToolDef`] sent to the LLM.
    fn definition(&self) -> ToolDef {
        ToolDef {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters(),
        }
    }

    /// Execute the tool.
    ///
    /// `args` has already been validated against [`parameters`](Tool::parameters).
    async fn execute(
        &self,
        tool_call_id: &str,
        args: Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}
