//! Event types for agent operation.
//!
//! Two event families:
//!
//! - **[`AssistantEvent`]**: incremental streaming events produced by an
//!   LLM adapter while an assistant message is being generated. Every
//!   non-terminal variant carries a `partial` snapshot of the evolving
//!   message; the engine treats that snapshot as authoritative and never
//!   reconstructs content from deltas.
//! - **[`AgentEvent`]**: lifecycle events emitted by the agent loop
//!   (run/turn boundaries, message lifecycle, tool execution, advisors).
//!
//! `AgentEvent` message payloads are independent clones of the log slot,
//! so observers may hold them across await points.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::ToolCall;
use crate::messages::{AssistantMessage, Message};
use crate::tools::ToolOutput;

// ─────────────────────────────────────────────────────────────────────────────
// AssistantEvent — adapter streaming protocol
// ─────────────────────────────────────────────────────────────────────────────

/// Events emitted by a streaming adapter while producing an assistant
/// message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    /// Initial skeleton of the assistant message.
    Start {
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// A text block started.
    #[serde(rename_all = "camelCase")]
    TextStart {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// Incremental text content.
    #[serde(rename_all = "camelCase")]
    TextDelta {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Text fragment.
        delta: String,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// A text block completed.
    #[serde(rename_all = "camelCase")]
    TextEnd {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Full accumulated text.
        content: String,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// A thinking block started. Adapters may omit thinking events.
    #[serde(rename_all = "camelCase")]
    ThinkingStart {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// Incremental thinking content.
    #[serde(rename_all = "camelCase")]
    ThinkingDelta {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Thinking fragment.
        delta: String,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// A thinking block completed.
    #[serde(rename_all = "camelCase")]
    ThinkingEnd {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Full thinking text.
        content: String,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// A tool call block started.
    #[serde(rename = "toolcall_start")]
    #[serde(rename_all = "camelCase")]
    ToolCallStart {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// Incremental tool call argument JSON.
    #[serde(rename = "toolcall_delta")]
    #[serde(rename_all = "camelCase")]
    ToolCallDelta {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// Partial JSON arguments fragment.
        delta: String,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// A tool call block fully constructed.
    #[serde(rename = "toolcall_end")]
    #[serde(rename_all = "camelCase")]
    ToolCallEnd {
        /// Index of the block in `partial.content`.
        content_index: usize,
        /// The complete tool call.
        tool_call: ToolCall,
        /// Snapshot of the message so far.
        partial: AssistantMessage,
    },

    /// Stream completed successfully.
    Done {
        /// The final assistant message.
        message: AssistantMessage,
    },

    /// Stream failed or was aborted. The message carries the failure as
    /// its stop reason (`Error` or `Aborted`).
    Error {
        /// The final assistant message.
        message: AssistantMessage,
    },
}

impl AssistantEvent {
    /// Returns `true` for `Done` and `Error`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// The snapshot carried by a non-terminal event.
    #[must_use]
    pub fn partial(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Start { partial }
            | Self::TextStart { partial, .. }
            | Self::TextDelta { partial, .. }
            | Self::TextEnd { partial, .. }
            | Self::ThinkingStart { partial, .. }
            | Self::ThinkingDelta { partial, .. }
            | Self::ThinkingEnd { partial, .. }
            | Self::ToolCallStart { partial, .. }
            | Self::ToolCallDelta { partial, .. }
            | Self::ToolCallEnd { partial, .. } => Some(partial),
            Self::Done { .. } | Self::Error { .. } => None,
        }
    }

    /// The final message carried by a terminal event.
    #[must_use]
    pub fn final_message(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Done { message } | Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AgentEvent — loop lifecycle events
// ─────────────────────────────────────────────────────────────────────────────

/// Events emitted by the agent loop over its event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Run started.
    AgentStart,

    /// Run completed. Always the last event on the stream.
    AgentEnd {
        /// All messages appended to the log during this run.
        messages: Vec<Message>,
        /// Failure description when the run stopped on an error or abort.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Turn started.
    #[serde(rename_all = "camelCase")]
    TurnStart {
        /// Zero-based turn counter within the run.
        turn_index: usize,
    },

    /// Turn completed.
    #[serde(rename_all = "camelCase")]
    TurnEnd {
        /// Zero-based turn counter within the run.
        turn_index: usize,
        /// The turn's assistant message.
        message: Message,
        /// Tool results produced during the turn.
        tool_results: Vec<Message>,
    },

    /// A message was appended (or, for assistant messages, began streaming).
    MessageStart {
        /// The message.
        message: Message,
    },

    /// An in-progress assistant message changed.
    MessageUpdate {
        /// Fresh snapshot of the in-progress message.
        message: Message,
        /// The adapter event that caused the change.
        event: Box<AssistantEvent>,
    },

    /// A message reached its final form.
    MessageEnd {
        /// The message.
        message: Message,
    },

    /// Tool execution started.
    #[serde(rename_all = "camelCase")]
    ToolExecutionStart {
        /// Tool call ID.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Arguments the tool was invoked with.
        args: Value,
    },

    /// Tool reported intermediate output.
    #[serde(rename_all = "camelCase")]
    ToolExecutionUpdate {
        /// Tool call ID.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Arguments the tool was invoked with.
        args: Value,
        /// Partial output.
        partial: ToolOutput,
    },

    /// Tool execution completed.
    #[serde(rename_all = "camelCase")]
    ToolExecutionEnd {
        /// Tool call ID.
        tool_call_id: String,
        /// Tool name.
        tool_name: String,
        /// Final output.
        result: ToolOutput,
        /// Whether the execution failed.
        is_error: bool,
    },

    /// An advisor was triggered.
    #[serde(rename_all = "camelCase")]
    AdvisorStart {
        /// Advisor name.
        advisor_name: String,
        /// Name of the tool whose result triggered it.
        tool_name: String,
    },

    /// An event from a nested advisor run, forwarded to the parent stream.
    #[serde(rename_all = "camelCase")]
    AdvisorEvent {
        /// Advisor name.
        advisor_name: String,
        /// The child event.
        event: Box<AgentEvent>,
    },

    /// An advisor completed and (if non-empty) its verdict was injected.
    #[serde(rename_all = "camelCase")]
    AdvisorEnd {
        /// Advisor name.
        advisor_name: String,
        /// The extracted verdict.
        content: String,
    },

    /// An advisor failed; the parent run is unaffected.
    #[serde(rename_all = "camelCase")]
    AdvisorError {
        /// Advisor name.
        advisor_name: String,
        /// Failure description.
        error: String,
    },
}

impl AgentEvent {
    /// Returns `true` exactly for `AgentEnd`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AgentEnd { .. })
    }

    /// Snake-case discriminator, as serialized in the `type` field.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AgentStart => "agent_start",
            Self::AgentEnd { .. } => "agent_end",
            Self::TurnStart { .. } => "turn_start",
            Self::TurnEnd { .. } => "turn_end",
            Self::MessageStart { .. } => "message_start",
            Self::MessageUpdate { .. } => "message_update",
            Self::MessageEnd { .. } => "message_end",
            Self::ToolExecutionStart { .. } => "tool_execution_start",
            Self::ToolExecutionUpdate { .. } => "tool_execution_update",
            Self::ToolExecutionEnd { .. } => "tool_execution_end",
            Self::AdvisorStart { .. } => "advisor_start",
            Self::AdvisorEvent { .. } => "advisor_event",
            Self::AdvisorEnd { .. } => "advisor_end",
            Self::AdvisorError { .. } => "advisor_error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::AssistantContent;
    use crate::messages::{StopReason, TokenUsage};

    fn partial(text: &str) -> AssistantMessage {
        AssistantMessage {
            content: vec![AssistantContent::text(text)],
            stop_reason: StopReason::Stop,
            error_message: None,
            model: "test-model".into(),
            usage: TokenUsage::default(),
            timestamp: 0,
        }
    }

    #[test]
    fn assistant_event_terminality() {
        let start = AssistantEvent::Start {
            partial: partial(""),
        };
        assert!(!start.is_terminal());
        assert!(start.partial().is_some());
        assert!(start.final_message().is_none());

        let done = AssistantEvent::Done {
            message: partial("hi"),
        };
        assert!(done.is_terminal());
        assert!(done.partial().is_none());
        assert_eq!(
            done.final_message().unwrap().content[0].as_text(),
            Some("hi")
        );
    }

    #[test]
    fn assistant_event_serde_tags() {
        let ev = AssistantEvent::TextDelta {
            content_index: 0,
            delta: "h".into(),
            partial: partial("h"),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "text_delta");
        assert_eq!(json["contentIndex"], 0);
        let back: AssistantEvent = serde_json::from_value(json).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn agent_event_terminality() {
        assert!(AgentEvent::AgentEnd {
            messages: vec![],
            error: None
        }
        .is_terminal());
        assert!(!AgentEvent::AgentStart.is_terminal());
        assert!(!AgentEvent::TurnStart { turn_index: 0 }.is_terminal());
    }

    #[test]
    fn agent_event_type_matches_serde_tag() {
        let events = vec![
            AgentEvent::AgentStart,
            AgentEvent::TurnStart { turn_index: 0 },
            AgentEvent::MessageStart {
                message: Message::user("hi"),
            },
            AgentEvent::AdvisorError {
                advisor_name: "reviewer".into(),
                error: "bad".into(),
            },
        ];
        for ev in events {
            let json = serde_json::to_value(&ev).unwrap();
            assert_eq!(json["type"], ev.event_type());
        }
    }

    #[test]
    fn advisor_event_wraps_child_events() {
        let child = AgentEvent::TurnStart { turn_index: 0 };
        let wrapped = AgentEvent::AdvisorEvent {
            advisor_name: "reviewer".into(),
            event: Box::new(child.clone()),
        };
        let json = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(json["type"], "advisor_event");
        assert_eq!(json["event"]["type"], "turn_start");
        let back: AgentEvent = serde_json::from_value(json).unwrap();
        match back {
            AgentEvent::AdvisorEvent { event, .. } => assert_eq!(*event, child),
            _ => panic!("expected advisor_event"),
        }
    }
}
