//! Runtime error types.

use thiserror::Error;

/// Errors surfaced by the agent loop's entry points and hooks.
///
/// Most failures inside a run are recorded as messages or events so the
/// model can observe and recover. These errors are the exceptions:
/// caller misuse detected before a run starts, and user-hook failures
/// that advisors isolate.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The resume entry was called while the log ends in a message role
    /// it cannot continue from.
    #[error("Cannot continue from message role: {role}")]
    ResumeFromRole {
        /// The offending role.
        role: String,
    },

    /// The resume entry was called with an empty log.
    #[error("Cannot continue: no messages in context")]
    EmptyContext,

    /// A caller-supplied hook (advisor trigger, context factory, …) failed.
    #[error("{message}")]
    Hook {
        /// Failure description.
        message: String,
    },
}

impl AgentError {
    /// Create a hook failure from any displayable error.
    #[must_use]
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }
}
