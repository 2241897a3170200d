//! # tiller-runtime
//!
//! The turn-based agent loop:
//!
//! - **Entry points**: [`agent::start`] and [`agent::resume`] drive one
//!   conversation and return an ordered event stream sealed with the
//!   run's new messages.
//! - **Stream driver**: consumes adapter events, maintaining the single
//!   in-progress assistant message in the log.
//! - **Tool dispatcher**: validates, executes, and records tool calls in
//!   declaration order; steering messages interrupt the batch.
//! - **Advisors**: recursively nested sub-agent runs fired after tool
//!   results, isolated from the parent on failure.
//!
//! Failures inside a run are recorded as messages or events the model
//! can observe; only caller misuse of the resume entry raises an error.

#![deny(unsafe_code)]

pub mod advisor;
pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod projection;

pub use advisor::{on_tools, AdvisorConfig, AdvisorSeed, TriggerParams};
pub use agent::{resume, start, RunStream};
pub use config::{
    AgentConfig, ApiKeyResolver, ContextTransform, LlmProjection, MessageFetcher, MessageQueue,
};
pub use context::{AgentContext, SharedContext};
pub use error::AgentError;
pub use projection::default_convert_to_llm;
