//! Agent loop entry points.
//!
//! Two ways into a run: [`start`] appends prompt messages and begins a
//! fresh run; [`resume`] continues from an existing log (after a tool
//! result or user message, never from an assistant message). Both return
//! the consumer half of the run's event stream; the loop itself runs as a
//! spawned task and seals the stream with the messages it appended.

mod dispatcher;
mod run_loop;
mod stream_driver;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tiller_core::events::AgentEvent;
use tiller_core::messages::Message;
use tiller_core::stream::{channel, EventSink, EventStream};
use tiller_llm::adapter::StreamAdapter;

use crate::config::AgentConfig;
use crate::context::SharedContext;
use crate::error::AgentError;

/// Consumer half of a run's event stream. Yields ordered [`AgentEvent`]s
/// ending with `agent_end`; the sealed result is the run's new messages.
pub type RunStream = EventStream<AgentEvent, Vec<Message>>;

/// Producer half of a run's event stream.
pub(crate) type RunSink = EventSink<AgentEvent, Vec<Message>>;

/// Start a run with prompt messages.
///
/// The prompts are appended to the log verbatim (an empty list is legal);
/// steering is polled once before the first turn. Returns immediately;
/// consume the stream to observe the run.
pub fn start(
    prompts: Vec<Message>,
    context: SharedContext,
    config: Arc<AgentConfig>,
    adapter: Arc<dyn StreamAdapter>,
    cancel: CancellationToken,
) -> RunStream {
    let (sink, stream) = channel();
    let _task = tokio::spawn(run_loop::drive(run_loop::RunArgs {
        prompts,
        pre_poll_steering: true,
        context,
        config,
        adapter,
        cancel,
        sink,
    }));
    stream
}

/// Continue a run from the current log without new prompts.
///
/// Fails before any event is emitted when the log is empty or ends in an
/// assistant message. Unlike [`start`], steering is not pre-polled.
pub async fn resume(
    context: SharedContext,
    config: Arc<AgentConfig>,
    adapter: Arc<dyn StreamAdapter>,
    cancel: CancellationToken,
) -> Result<RunStream, AgentError> {
    {
        let ctx = context.lock().await;
        if ctx.messages.is_empty() {
            return Err(AgentError::EmptyContext);
        }
        if let Some(last) = ctx.messages.last() {
            if last.is_assistant() {
                return Err(AgentError::ResumeFromRole {
                    role: last.role().to_owned(),
                });
            }
        }
    }

    let (sink, stream) = channel();
    let _task = tokio::spawn(run_loop::drive(run_loop::RunArgs {
        prompts: Vec::new(),
        pre_poll_steering: false,
        context,
        config,
        adapter,
        cancel,
        sink,
    }));
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tiller_core::content::AssistantContent;
    use tiller_core::messages::{AssistantMessage, StopReason, TokenUsage};
    use tiller_llm::adapter::{AssistantEventStream, LlmContext, StreamOptions};
    use tiller_llm::error::AdapterError;

    use crate::context::AgentContext;
    use crate::projection::default_convert_to_llm;

    struct NeverCalled;

    #[async_trait]
    impl StreamAdapter for NeverCalled {
        async fn stream(
            &self,
            _model: &str,
            _context: &LlmContext,
            _options: &StreamOptions,
        ) -> Result<AssistantEventStream, AdapterError> {
            panic!("adapter must not be called");
        }
    }

    fn config() -> Arc<AgentConfig> {
        Arc::new(AgentConfig::new("test-model", default_convert_to_llm()))
    }

    #[tokio::test]
    async fn resume_rejects_empty_log() {
        let context = AgentContext::default().shared();
        let err = resume(
            context,
            config(),
            Arc::new(NeverCalled),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Cannot continue: no messages in context");
    }

    #[tokio::test]
    async fn resume_rejects_trailing_assistant() {
        let mut ctx = AgentContext::default();
        ctx.messages.push(Message::user("hi"));
        ctx.messages.push(Message::Assistant(AssistantMessage {
            content: vec![AssistantContent::text("hello")],
            stop_reason: StopReason::Stop,
            error_message: None,
            model: "test-model".into(),
            usage: TokenUsage::default(),
            timestamp: 0,
        }));

        let err = resume(
            ctx.shared(),
            config(),
            Arc::new(NeverCalled),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot continue from message role: assistant"
        );
    }
}
