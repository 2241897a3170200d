//! Message types for the agent conversation log.
//!
//! Messages form the conversation history the loop appends to and the
//! LLM projection reads from. Four built-in roles (user, assistant, tool
//! result, advisor) plus an open `extension` variant that the engine
//! carries opaquely and only the projection interprets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{AssistantContent, ToolCall, ToolResultContent, UserContent};

/// Current wall-clock time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ─────────────────────────────────────────────────────────────────────────────
// Stop reason and token usage
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons why an assistant response ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// Natural end of response.
    Stop,
    /// The model wants to use tools.
    ToolUse,
    /// The model call failed.
    Error,
    /// The run was aborted mid-response.
    Aborted,
    /// Hit the output token limit.
    Length,
}

impl StopReason {
    /// Returns `true` for the reasons that end the run at the next decision
    /// point (`Error` and `Aborted`).
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Error | Self::Aborted)
    }
}

/// Token usage reported with an assistant message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
    /// Tokens read from prompt cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    /// Tokens written to prompt cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-role message bodies
// ─────────────────────────────────────────────────────────────────────────────

/// Content of a user message — either a plain string or structured blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserMessageContent {
    /// Simple text.
    Text(String),
    /// Structured content blocks.
    Blocks(Vec<UserContent>),
}

/// An assistant response, possibly still in progress while streaming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    /// Ordered content blocks.
    pub content: Vec<AssistantContent>,
    /// Why the response ended.
    pub stop_reason: StopReason,
    /// Failure description when `stop_reason` is `Error` or `Aborted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Model that produced the response.
    pub model: String,
    /// Token usage.
    pub usage: TokenUsage,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl AssistantMessage {
    /// Tool calls in this message, in declaration order.
    #[must_use]
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.content
            .iter()
            .filter_map(AssistantContent::as_tool_call)
            .collect()
    }
}

/// The outcome of one tool call, paired to it by `tool_call_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultMessage {
    /// ID of the tool call this result answers.
    pub tool_call_id: String,
    /// Tool name.
    pub tool_name: String,
    /// Result content blocks.
    pub content: Vec<ToolResultContent>,
    /// Opaque tool-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Whether the execution failed.
    pub is_error: bool,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// A sub-agent's verdict, injected into the parent log after a tool result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorMessage {
    /// Advisor name.
    pub advisor_name: String,
    /// The advisor's final textual verdict.
    pub content: String,
    /// Model that produced the verdict.
    pub model: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Message enum
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation message (discriminated by `role`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Message {
    /// User message.
    #[serde(rename = "user")]
    User {
        /// Message content.
        content: UserMessageContent,
        /// Epoch milliseconds.
        timestamp: i64,
    },
    /// Assistant message.
    #[serde(rename = "assistant")]
    Assistant(AssistantMessage),
    /// Tool result message.
    #[serde(rename = "toolResult")]
    ToolResult(ToolResultMessage),
    /// Advisor verdict message.
    #[serde(rename = "advisor")]
    Advisor(AdvisorMessage),
    /// App-defined message. The loop carries it opaquely; only the LLM
    /// projection interprets (or drops) it.
    #[serde(rename = "extension")]
    Extension {
        /// App-defined discriminator.
        tag: String,
        /// Opaque payload.
        payload: Value,
        /// Epoch milliseconds.
        timestamp: i64,
    },
}

impl Message {
    /// Create a user message from a plain string, stamped with the current time.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            content: UserMessageContent::Text(text.into()),
            timestamp: now_ms(),
        }
    }

    /// Create a user message from structured content blocks.
    #[must_use]
    pub fn user_blocks(blocks: Vec<UserContent>) -> Self {
        Self::User {
            content: UserMessageContent::Blocks(blocks),
            timestamp: now_ms(),
        }
    }

    /// The `role` discriminator of this message.
    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant(_) => "assistant",
            Self::ToolResult(_) => "toolResult",
            Self::Advisor(_) => "advisor",
            Self::Extension { .. } => "extension",
        }
    }

    /// Returns `true` if this is a user message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Returns `true` if this is an assistant message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant(_))
    }

    /// Returns `true` if this is a tool result message.
    #[must_use]
    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult(_))
    }

    /// Returns the assistant body if this is an assistant message.
    #[must_use]
    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Assistant(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the tool result body if this is a tool result message.
    #[must_use]
    pub fn as_tool_result(&self) -> Option<&ToolResultMessage> {
        match self {
            Self::ToolResult(m) => Some(m),
            _ => None,
        }
    }
}

/// Text blocks of assistant content joined with newlines.
///
/// Thinking and tool call blocks are skipped.
#[must_use]
pub fn extract_assistant_text(content: &[AssistantContent]) -> String {
    content
        .iter()
        .filter_map(AssistantContent::as_text)
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
