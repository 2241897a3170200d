//! # tiller-core
//!
//! Foundation types for the Tiller agent engine.
//!
//! This crate provides the shared vocabulary the other Tiller crates
//! depend on:
//!
//! - **Content blocks**: per-role block enums covering text, images,
//!   thinking, and tool calls
//! - **Messages**: `Message` enum with `user`, `assistant`, `toolResult`,
//!   `advisor`, and an open `extension` variant
//! - **Events**: `AssistantEvent` (adapter streaming protocol) and
//!   `AgentEvent` (loop lifecycle)
//! - **Event stream**: single-consumer pipe with a sealed result value
//! - **Tool types**: tool definitions, parameter schemas, and outputs

#![deny(unsafe_code)]

pub mod content;
pub mod events;
pub mod messages;
pub mod stream;
pub mod tools;

pub use content::{AssistantContent, ToolCall, ToolResultContent, UserContent};
pub use events::{AgentEvent, AssistantEvent};
pub use messages::{
    extract_assistant_text, now_ms, AdvisorMessage, AssistantMessage, Message, StopReason,
    TokenUsage, ToolResultMessage, UserMessageContent,
};
pub use stream::{channel, EventSink, EventStream};
pub use tools::{ParameterSchema, ToolDef, ToolOutput};
