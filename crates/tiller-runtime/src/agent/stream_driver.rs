//! Stream driver — runs one assistant response.
//!
//! Builds the LLM request from the projected log, consumes the adapter's
//! event stream, and maintains the single in-progress assistant slot in
//! the log. The adapter's `partial` snapshots are authoritative; the
//! driver replaces the slot wholesale and never reconstructs content from
//! deltas. Model failures are recorded as error-stop assistant messages,
//! never propagated.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Map;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tiller_core::events::{AgentEvent, AssistantEvent};
use tiller_core::messages::{now_ms, AssistantMessage, Message, StopReason, TokenUsage};
use tiller_llm::adapter::{LlmContext, StreamAdapter, StreamOptions};

use crate::agent::RunSink;
use crate::config::AgentConfig;
use crate::context::SharedContext;

/// Stream one assistant response into the log and the event stream.
pub(crate) async fn stream_assistant(
    context: &SharedContext,
    config: &AgentConfig,
    adapter: &Arc<dyn StreamAdapter>,
    cancel: &CancellationToken,
    sink: &RunSink,
) -> AssistantMessage {
    // Project the log: optional transform, then the LLM projection.
    let (system_prompt, tools, log_snapshot) = {
        let ctx = context.lock().await;
        (
            ctx.system_prompt.clone(),
            ctx.tools.definitions(),
            ctx.messages.clone(),
        )
    };
    let transformed = match &config.transform_context {
        Some(transform) => transform(log_snapshot).await,
        None => log_snapshot,
    };
    let messages = (config.convert_to_llm)(transformed).await;

    // The key is re-resolved on every call to tolerate rotating tokens.
    let api_key = config.resolve_api_key().await;

    let llm_context = LlmContext {
        system_prompt,
        messages,
        tools,
    };
    let options = StreamOptions {
        api_key,
        reasoning: config.reasoning,
        cancel: cancel.clone(),
        extra: Map::new(),
    };

    let mut slot: Option<usize> = None;
    let mut last_partial: Option<AssistantMessage> = None;

    let mut stream = match adapter.stream(&config.model, &llm_context, &options).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(model = %config.model, error = %e, "adapter request failed");
            let message = if e.is_cancelled() {
                aborted_message(None, &config.model)
            } else {
                failed_message(None, &config.model, e.to_string())
            };
            finalize(context, slot, message.clone(), sink).await;
            return message;
        }
    };
    debug!(model = %config.model, "assistant stream opened");

    loop {
        // Prefer cancellation when both it and a stream event are ready.
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let message = aborted_message(last_partial.take(), &config.model);
                finalize(context, slot, message.clone(), sink).await;
                return message;
            }
            item = stream.next() => item,
        };

        match item {
            None => {
                warn!(model = %config.model, "stream ended without a terminal event");
                let message = failed_message(
                    last_partial.take(),
                    &config.model,
                    "Stream ended without a terminal event".into(),
                );
                finalize(context, slot, message.clone(), sink).await;
                return message;
            }
            Some(Err(e)) => {
                let message = if e.is_cancelled() {
                    aborted_message(last_partial.take(), &config.model)
                } else {
                    warn!(model = %config.model, error = %e, "stream failed");
                    failed_message(last_partial.take(), &config.model, e.to_string())
                };
                finalize(context, slot, message.clone(), sink).await;
                return message;
            }
            Some(Ok(event)) => match event {
                AssistantEvent::Done { message } | AssistantEvent::Error { message } => {
                    finalize(context, slot, message.clone(), sink).await;
                    return message;
                }
                event => {
                    let Some(partial) = event.partial().cloned() else {
                        continue;
                    };
                    let inserted_now = place_partial(context, &mut slot, partial.clone()).await;
                    if inserted_now {
                        sink.push(AgentEvent::MessageStart {
                            message: Message::Assistant(partial.clone()),
                        });
                    }
                    sink.push(AgentEvent::MessageUpdate {
                        message: Message::Assistant(partial.clone()),
                        event: Box::new(event),
                    });
                    last_partial = Some(partial);
                }
            },
        }
    }
}

/// Write the partial into its log slot, inserting on first use.
/// Returns `true` when the slot was created by this call.
async fn place_partial(
    context: &SharedContext,
    slot: &mut Option<usize>,
    partial: AssistantMessage,
) -> bool {
    let mut ctx = context.lock().await;
    match *slot {
        Some(index) => {
            ctx.messages[index] = Message::Assistant(partial);
            false
        }
        None => {
            ctx.messages.push(Message::Assistant(partial));
            *slot = Some(ctx.messages.len() - 1);
            true
        }
    }
}

/// Replace the slot with the final message (or append it when no partial
/// ever arrived) and emit the closing events.
async fn finalize(
    context: &SharedContext,
    slot: Option<usize>,
    message: AssistantMessage,
    sink: &RunSink,
) {
    let message = Message::Assistant(message);
    {
        let mut ctx = context.lock().await;
        match slot {
            Some(index) => ctx.messages[index] = message.clone(),
            None => ctx.messages.push(message.clone()),
        }
    }
    if slot.is_none() {
        sink.push(AgentEvent::MessageStart {
            message: message.clone(),
        });
    }
    sink.push(AgentEvent::MessageEnd { message });
}

fn empty_message(model: &str) -> AssistantMessage {
    AssistantMessage {
        content: Vec::new(),
        stop_reason: StopReason::Stop,
        error_message: None,
        model: model.to_owned(),
        usage: TokenUsage::default(),
        timestamp: now_ms(),
    }
}

/// An aborted final message, keeping whatever partial content streamed.
fn aborted_message(partial: Option<AssistantMessage>, model: &str) -> AssistantMessage {
    let mut message = partial.unwrap_or_else(|| empty_message(model));
    message.stop_reason = StopReason::Aborted;
    message.error_message = Some("Aborted".into());
    message
}

/// An error final message, keeping whatever partial content streamed.
fn failed_message(
    partial: Option<AssistantMessage>,
    model: &str,
    error: String,
) -> AssistantMessage {
    let mut message = partial.unwrap_or_else(|| empty_message(model));
    message.stop_reason = StopReason::Error;
    message.error_message = Some(error);
    message
}
