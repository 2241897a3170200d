//! The caller-supplied conversation context.

use std::sync::Arc;

use tokio::sync::Mutex;

use tiller_core::messages::Message;
use tiller_tools::registry::ToolRegistry;

/// A conversation: system prompt, message log, and the tools available to
/// the model.
///
/// The log is owned by the caller; for the duration of a run the loop is
/// its only writer. Event payloads are independent clones, so observers
/// never need the lock.
#[derive(Default)]
pub struct AgentContext {
    /// System prompt for LLM requests.
    pub system_prompt: Option<String>,
    /// The full message log. Appended monotonically; never reordered.
    pub messages: Vec<Message>,
    /// Tools available to the model.
    pub tools: ToolRegistry,
}

/// Shared handle to an [`AgentContext`].
pub type SharedContext = Arc<Mutex<AgentContext>>;

impl AgentContext {
    /// Create an empty context with the given system prompt.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(system_prompt.into()),
            messages: Vec::new(),
            tools: ToolRegistry::new(),
        }
    }

    /// Wrap into a [`SharedContext`] for a run.
    #[must_use]
    pub fn shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }
}
