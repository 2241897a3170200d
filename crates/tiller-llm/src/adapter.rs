//! # Streaming adapter contract
//!
//! The engine asks an external model for an assistant message through
//! [`StreamAdapter`]. The returned handle is an async stream of
//! [`AssistantEvent`]s ending with `Done` (the final message) or `Error`
//! (a final message whose stop reason is `Error` or `Aborted`). Every
//! non-terminal event carries a consistent `partial` snapshot of the
//! evolving message, so the engine never reconstructs state from deltas.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use tiller_core::events::AssistantEvent;
use tiller_core::messages::Message;
use tiller_core::tools::ToolDef;

use crate::error::AdapterError;

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Boxed stream of [`AssistantEvent`]s returned by [`StreamAdapter::stream`].
pub type AssistantEventStream =
    Pin<Box<dyn Stream<Item = Result<AssistantEvent, AdapterError>> + Send>>;

/// Reasoning effort forwarded to the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningLevel {
    /// Low reasoning effort.
    Low,
    /// Medium reasoning effort.
    Medium,
    /// High reasoning effort.
    High,
}

/// The projected conversation an adapter receives.
///
/// `messages` is the caller's LLM projection of the full log; by contract
/// it contains only the standard variants (user / assistant / tool result).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmContext {
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Projected conversation messages.
    pub messages: Vec<Message>,
    /// Available tools.
    pub tools: Vec<ToolDef>,
}

/// Options for one adapter stream request.
#[derive(Clone, Debug, Default)]
pub struct StreamOptions {
    /// API key for this call. Re-resolved by the loop before every call,
    /// never cached across calls.
    pub api_key: Option<String>,
    /// Reasoning effort.
    pub reasoning: Option<ReasoningLevel>,
    /// Cooperative cancellation. Adapters should stop streaming promptly
    /// and terminate with an `Aborted` message when this fires.
    pub cancel: CancellationToken,
    /// Adapter-specific knobs, passed through opaquely.
    pub extra: Map<String, Value>,
}

/// Contract by which the engine asks an external model to produce an
/// assistant message incrementally.
#[async_trait]
pub trait StreamAdapter: Send + Sync {
    /// Stream an assistant response for the projected context.
    ///
    /// The caller consumes events until `Done` or `Error`; a stream that
    /// finishes without a terminal event is a protocol violation the
    /// engine records as a failed response.
    async fn stream(
        &self,
        model: &str,
        context: &LlmContext,
        options: &StreamOptions,
    ) -> AdapterResult<AssistantEventStream>;
}
