//! Tool dispatcher — runs an assistant message's tool calls in order.
//!
//! Per call: look up the tool, validate arguments against its schema,
//! execute with cancellation and update fan-in, and synthesize the tool
//! result message. Failures become error results, never panics or
//! propagated errors. After each result the configured advisors run, then
//! steering is polled; queued steering skips every remaining call.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tiller_core::content::{ToolCall, ToolResultContent};
use tiller_core::events::AgentEvent;
use tiller_core::messages::{now_ms, Message, ToolResultMessage};
use tiller_core::tools::ToolOutput;
use tiller_llm::adapter::StreamAdapter;
use tiller_tools::schema::validate_arguments;
use tiller_tools::traits::{ToolContext, UpdateSender};

use crate::advisor;
use crate::agent::RunSink;
use crate::config::AgentConfig;
use crate::context::SharedContext;

/// Result text for tool calls skipped by a steering interrupt.
const SKIPPED_MESSAGE: &str = "Skipped due to queued user message.";

/// Outcome of dispatching one assistant message's tool calls.
pub(crate) struct DispatchOutcome {
    /// One tool result message per tool call, in declaration order.
    pub results: Vec<Message>,
    /// Steering messages that interrupted the batch, if any.
    pub steering: Option<Vec<Message>>,
}

/// Run every tool call of one assistant message, in declaration order.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_tool_calls(
    tool_calls: &[ToolCall],
    context: &SharedContext,
    config: &Arc<AgentConfig>,
    adapter: &Arc<dyn StreamAdapter>,
    cancel: &CancellationToken,
    sink: &RunSink,
    new_messages: &mut Vec<Message>,
) -> DispatchOutcome {
    let mut results = Vec::with_capacity(tool_calls.len());
    let mut steering: Option<Vec<Message>> = None;

    for (index, call) in tool_calls.iter().enumerate() {
        let (output, is_error) = execute_one(call, context, cancel, sink).await;

        let result = record_result(call, output, is_error, context, sink, new_messages).await;
        results.push(Message::ToolResult(result.clone()));

        // Advisors observe the result before steering can interrupt.
        advisor::run_for_tool_result(
            call,
            &result,
            context,
            config,
            adapter,
            cancel,
            sink,
            new_messages,
        )
        .await;

        // Delivery boundary: a queued user message skips the rest of the batch.
        let queued = config.drain_steering().await;
        if !queued.is_empty() {
            info!(
                remaining = tool_calls.len() - index - 1,
                "steering message queued, skipping remaining tool calls"
            );
            for skipped in &tool_calls[index + 1..] {
                let result = skip_call(skipped, context, sink, new_messages).await;
                results.push(Message::ToolResult(result));
            }
            steering = Some(queued);
            break;
        }
    }

    DispatchOutcome { results, steering }
}

/// Execute a single call: lookup, validation, execution, error wrapping.
async fn execute_one(
    call: &ToolCall,
    context: &SharedContext,
    cancel: &CancellationToken,
    sink: &RunSink,
) -> (ToolOutput, bool) {
    let args = Value::Object(call.arguments.clone());

    sink.push(AgentEvent::ToolExecutionStart {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        args: args.clone(),
    });
    debug!(tool_name = %call.name, tool_call_id = %call.id, "tool execution started");

    let tool = match context.lock().await.tools.lookup(&call.name) {
        Ok(tool) => tool,
        Err(e) => {
            warn!(tool_name = %call.name, "tool not found");
            let output = ToolOutput::text(e.to_string());
            finish(call, output.clone(), true, sink);
            return (output, true);
        }
    };

    if let Err(e) = validate_arguments(&tool.parameters(), &args) {
        warn!(tool_name = %call.name, error = %e, "argument validation failed");
        let output = ToolOutput::text(e.to_string());
        finish(call, output.clone(), true, sink);
        return (output, true);
    }

    // Fan tool updates into the event stream while the execution runs.
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let ctx = ToolContext {
        cancel: cancel.clone(),
        updates: UpdateSender::new(update_tx),
    };
    let execution = tool.execute(&call.id, args.clone(), &ctx);
    tokio::pin!(execution);

    let outcome = loop {
        tokio::select! {
            Some(partial) = update_rx.recv() => {
                sink.push(AgentEvent::ToolExecutionUpdate {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    args: args.clone(),
                    partial,
                });
            }
            outcome = &mut execution => break outcome,
        }
    };
    // Flush updates sent in the tool's final poll.
    while let Ok(partial) = update_rx.try_recv() {
        sink.push(AgentEvent::ToolExecutionUpdate {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            args: args.clone(),
            partial,
        });
    }

    let (output, is_error) = match outcome {
        Ok(output) => (output, false),
        Err(e) => {
            warn!(tool_name = %call.name, error = %e, "tool execution failed");
            (ToolOutput::text(e.to_string()), true)
        }
    };
    finish(call, output.clone(), is_error, sink);
    (output, is_error)
}

fn finish(call: &ToolCall, result: ToolOutput, is_error: bool, sink: &RunSink) {
    debug!(tool_name = %call.name, tool_call_id = %call.id, is_error, "tool execution ended");
    sink.push(AgentEvent::ToolExecutionEnd {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        result,
        is_error,
    });
}

/// Append the tool result to the log and emit its message events.
async fn record_result(
    call: &ToolCall,
    output: ToolOutput,
    is_error: bool,
    context: &SharedContext,
    sink: &RunSink,
    new_messages: &mut Vec<Message>,
) -> ToolResultMessage {
    let result = ToolResultMessage {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        content: output.content,
        details: output.details,
        is_error,
        timestamp: now_ms(),
    };
    let message = Message::ToolResult(result.clone());
    context.lock().await.messages.push(message.clone());
    new_messages.push(message.clone());
    sink.push(AgentEvent::MessageStart {
        message: message.clone(),
    });
    sink.push(AgentEvent::MessageEnd { message });
    result
}

/// Synthesize a skipped-call result. The execution start/end pair is
/// emitted without invoking the tool so downstream consumers see uniform
/// pairing.
async fn skip_call(
    call: &ToolCall,
    context: &SharedContext,
    sink: &RunSink,
    new_messages: &mut Vec<Message>,
) -> ToolResultMessage {
    let args = Value::Object(call.arguments.clone());
    let output = ToolOutput {
        content: vec![ToolResultContent::text(SKIPPED_MESSAGE)],
        details: None,
    };

    sink.push(AgentEvent::ToolExecutionStart {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        args,
    });
    sink.push(AgentEvent::ToolExecutionEnd {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        result: output.clone(),
        is_error: true,
    });

    record_result(call, output, true, context, sink, new_messages).await
}
