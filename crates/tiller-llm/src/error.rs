//! Adapter error types.

use thiserror::Error;

/// Errors that can occur while an adapter streams a response.
///
/// Concrete wire adapters (HTTP, SSE parsing, …) live outside this
/// workspace and map their transport failures into these variants.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Authentication failed (expired token, invalid key, etc.).
    #[error("auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Rate limited by the backend.
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds.
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// The backend returned an API error.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// The stream was cancelled.
    #[error("stream cancelled")]
    Cancelled,

    /// Adapter-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl AdapterError {
    /// Whether the run ended because of cancellation rather than failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
