//! The turn state machine.
//!
//! One run: inject pending user messages, stream an assistant response,
//! dispatch its tool calls, poll steering between turns and follow-ups at
//! idle, and seal the event stream with the messages this run appended.
//! The loop future is built by [`drive`] as a boxed future so advisor
//! runs can recurse through [`agent::start`](crate::agent::start).

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tiller_core::content::ToolCall;
use tiller_core::events::AgentEvent;
use tiller_core::messages::Message;
use tiller_llm::adapter::StreamAdapter;

use crate::agent::{dispatcher, stream_driver, RunSink};
use crate::config::AgentConfig;
use crate::context::SharedContext;

/// Everything one run needs; moved into the spawned loop task.
pub(crate) struct RunArgs {
    /// Prompt messages, injected verbatim as the first turn's pending batch.
    pub prompts: Vec<Message>,
    /// Whether to poll steering once before the first turn (start entry
    /// only; the resume entry does not pre-poll).
    pub pre_poll_steering: bool,
    /// The conversation.
    pub context: SharedContext,
    /// Run configuration.
    pub config: Arc<AgentConfig>,
    /// Streaming adapter.
    pub adapter: Arc<dyn StreamAdapter>,
    /// Abort signal, threaded through the adapter and every tool.
    pub cancel: CancellationToken,
    /// Producer half of the run's event stream.
    pub sink: RunSink,
}

/// Build the loop future. Boxed so the advisor runner can start nested
/// runs from inside a running loop.
pub(crate) fn drive(args: RunArgs) -> BoxFuture<'static, ()> {
    Box::pin(run(args))
}

async fn run(args: RunArgs) {
    let RunArgs {
        prompts,
        pre_poll_steering,
        context,
        config,
        adapter,
        cancel,
        mut sink,
    } = args;

    info!(model = %config.model, "agent run started");
    sink.push(AgentEvent::AgentStart);

    let mut new_messages: Vec<Message> = Vec::new();

    // Prompt messages are the first pending batch; steering polled before
    // the first turn joins them.
    let mut pending = prompts;
    if pre_poll_steering {
        pending.extend(config.drain_steering().await);
    }

    let mut turn_index = 0usize;
    let mut run_error: Option<String> = None;

    'run: loop {
        let mut has_tool_calls = true;

        while has_tool_calls || !pending.is_empty() {
            if let Some(max) = config.max_turns {
                if turn_index >= max {
                    warn!(max_turns = max, "maximum turns exceeded");
                    run_error = Some(format!("Maximum turns ({max}) exceeded"));
                    break 'run;
                }
            }

            sink.push(AgentEvent::TurnStart { turn_index });
            debug!(turn_index, "turn started");

            // Pending user messages (prompt follow-ups, steering) join the
            // log at the top of the turn.
            if !pending.is_empty() {
                let mut ctx = context.lock().await;
                for message in std::mem::take(&mut pending) {
                    ctx.messages.push(message.clone());
                    new_messages.push(message.clone());
                    sink.push(AgentEvent::MessageStart {
                        message: message.clone(),
                    });
                    sink.push(AgentEvent::MessageEnd { message });
                }
            }

            let assistant =
                stream_driver::stream_assistant(&context, &config, &adapter, &cancel, &sink)
                    .await;
            new_messages.push(Message::Assistant(assistant.clone()));

            // A failed or aborted response ends the run without tools.
            if assistant.stop_reason.is_fatal() {
                run_error = Some(
                    assistant
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "Assistant response failed".into()),
                );
                sink.push(AgentEvent::TurnEnd {
                    turn_index,
                    message: Message::Assistant(assistant),
                    tool_results: Vec::new(),
                });
                break 'run;
            }

            let tool_calls: Vec<ToolCall> =
                assistant.tool_calls().into_iter().cloned().collect();
            has_tool_calls = !tool_calls.is_empty();

            let mut steering_after: Option<Vec<Message>> = None;
            let mut tool_results: Vec<Message> = Vec::new();
            if has_tool_calls {
                let outcome = dispatcher::run_tool_calls(
                    &tool_calls,
                    &context,
                    &config,
                    &adapter,
                    &cancel,
                    &sink,
                    &mut new_messages,
                )
                .await;
                tool_results = outcome.results;
                steering_after = outcome.steering;
            }

            sink.push(AgentEvent::TurnEnd {
                turn_index,
                message: Message::Assistant(assistant),
                tool_results,
            });
            debug!(turn_index, "turn ended");
            turn_index += 1;

            // Steering handed up by the dispatcher takes precedence;
            // otherwise this is the between-turns delivery boundary.
            pending = match steering_after {
                Some(steering) => steering,
                None => config.drain_steering().await,
            };
        }

        // Idle: a non-empty follow-up batch continues the run.
        let follow_up = config.drain_follow_up().await;
        if follow_up.is_empty() {
            break;
        }
        debug!(count = follow_up.len(), "follow-up messages continue the run");
        pending = follow_up;
    }

    if let Some(error) = &run_error {
        warn!(turns = turn_index, error = %error, "agent run failed");
    } else {
        info!(turns = turn_index, "agent run completed");
    }
    sink.push(AgentEvent::AgentEnd {
        messages: new_messages.clone(),
        error: run_error,
    });
    sink.end(new_messages);
}
