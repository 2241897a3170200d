//! # tiller-llm
//!
//! The streaming adapter contract between the Tiller agent engine and
//! LLM backends. Every backend implements [`StreamAdapter`] to expose a
//! unified incremental interface; the engine consumes
//! [`AssistantEvent`](tiller_core::events::AssistantEvent)s until a
//! terminal `Done` or `Error`.
//!
//! Concrete wire protocols, token accounting, and prompt-cache handling
//! belong to adapter implementations outside this workspace.

#![deny(unsafe_code)]

pub mod adapter;
pub mod error;

pub use adapter::{
    AdapterResult, AssistantEventStream, LlmContext, ReasoningLevel, StreamAdapter, StreamOptions,
};
pub use error::AdapterError;
