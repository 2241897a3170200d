//! Tool error types.
//!
//! Unified error enum for tool execution failures. The dispatcher never
//! re-throws these; they become error tool results the model can observe.

use std::io;

use thiserror::Error;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No registered tool matches the requested name.
    #[error("Tool {name} not found")]
    UnknownTool {
        /// The requested tool name.
        name: String,
    },

    /// Argument validation failed.
    #[error("{message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Execution was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Execution timed out.
    #[error("timeout after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Generic I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (catch-all).
    #[error("{message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_display_names_the_tool() {
        let err = ToolError::UnknownTool {
            name: "shell".into(),
        };
        assert_eq!(err.to_string(), "Tool shell not found");
    }

    #[test]
    fn validation_display_is_bare_message() {
        let err = ToolError::Validation {
            message: "\"value\" is a required property".into(),
        };
        assert_eq!(err.to_string(), "\"value\" is a required property");
    }

    #[test]
    fn timeout_display_includes_ms() {
        let err = ToolError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "timeout after 5000ms");
    }

    #[test]
    fn from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: ToolError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }
}
