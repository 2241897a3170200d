//! Advisor sub-agents.
//!
//! An advisor is a recursively nested agent run fired after specific tool
//! results. Its verdict is injected into the parent log as a synthetic
//! observation; its events are forwarded to the parent stream wrapped in
//! `advisor_event`. Advisor failures never affect the parent run.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tiller_core::content::ToolCall;
use tiller_core::events::AgentEvent;
use tiller_core::messages::{
    extract_assistant_text, now_ms, AdvisorMessage, Message, ToolResultMessage,
};
use tiller_llm::adapter::{ReasoningLevel, StreamAdapter};
use tiller_tools::registry::ToolRegistry;
use tiller_tools::traits::Tool;

use crate::agent::{self, RunSink};
use crate::config::{AgentConfig, ApiKeyResolver, LlmProjection, MessageQueue};
use crate::context::{AgentContext, SharedContext};
use crate::error::AgentError;
use crate::projection::default_convert_to_llm;

// ─────────────────────────────────────────────────────────────────────────────
// Hook types
// ─────────────────────────────────────────────────────────────────────────────

/// What an advisor sees when deciding whether to fire.
#[derive(Clone, Debug)]
pub struct TriggerParams {
    /// Snapshot of the parent log, including earlier advisor verdicts.
    pub messages: Vec<Message>,
    /// Name of the tool that just ran.
    pub tool_name: String,
    /// Arguments the tool ran with.
    pub tool_args: Value,
    /// The tool result.
    pub tool_result: ToolResultMessage,
}

/// Decides whether the advisor fires for a tool result.
pub type Trigger =
    Arc<dyn Fn(TriggerParams) -> BoxFuture<'static, Result<bool, AgentError>> + Send + Sync>;

/// Builds the child run's starting state.
pub type ContextFactory =
    Arc<dyn Fn(TriggerParams) -> BoxFuture<'static, Result<AdvisorSeed, AgentError>> + Send + Sync>;

/// Extracts the advisor's verdict from the child run's new messages.
pub type ResultExtractor = Arc<dyn Fn(Vec<Message>) -> BoxFuture<'static, String> + Send + Sync>;

/// Starting state for an advisor's child run: the prompt messages become
/// the child's first pending batch; the child log starts empty.
#[derive(Clone, Debug, Default)]
pub struct AdvisorSeed {
    /// Child system prompt.
    pub system_prompt: Option<String>,
    /// Child prompt messages.
    pub messages: Vec<Message>,
}

/// A trigger that fires when the tool name matches one of `names`.
#[must_use]
pub fn on_tools<I, S>(names: I) -> Trigger
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    Arc::new(move |params: TriggerParams| {
        let fired = names.iter().any(|n| *n == params.tool_name);
        Box::pin(async move { Ok(fired) })
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Advisor configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for one advisor.
#[derive(Clone)]
pub struct AdvisorConfig {
    /// Stable identifier used in events and message tags.
    pub name: String,
    /// Model for the child run.
    pub model: String,
    /// Reasoning level for the child run.
    pub reasoning: Option<ReasoningLevel>,
    /// Static API key for the child run.
    pub api_key: Option<String>,
    /// Per-call API key resolver for the child run.
    pub get_api_key: Option<ApiKeyResolver>,
    /// Tools available to the child run. Empty makes the advisor a
    /// single-shot LLM call.
    pub tools: Vec<Arc<dyn Tool>>,
    /// Nested advisors (arbitrary depth).
    pub advisors: Vec<Arc<AdvisorConfig>>,
    /// Fires the advisor.
    pub trigger: Trigger,
    /// Builds the child run's starting state.
    pub create_context: ContextFactory,
    /// Verdict extraction; defaults to the text blocks of the child's last
    /// assistant message joined with newlines.
    pub extract_result: Option<ResultExtractor>,
    /// Child LLM projection; defaults to [`default_convert_to_llm`].
    pub convert_to_llm: Option<LlmProjection>,
}

impl AdvisorConfig {
    /// Create an advisor with the required hooks; everything else off.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        trigger: Trigger,
        create_context: ContextFactory,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            reasoning: None,
            api_key: None,
            get_api_key: None,
            tools: Vec::new(),
            advisors: Vec::new(),
            trigger,
            create_context,
            extract_result: None,
            convert_to_llm: None,
        }
    }
}

/// Default verdict extraction: text blocks of the last assistant message,
/// joined with newlines. Thinking blocks are excluded.
#[must_use]
pub fn default_extract_result(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find_map(Message::as_assistant)
        .map(|m| extract_assistant_text(&m.content))
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Advisor runner
// ─────────────────────────────────────────────────────────────────────────────

/// Run the configured advisors for one tool result, sequentially in
/// declaration order. Each advisor sees the log with prior advisor
/// verdicts already appended.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_for_tool_result(
    call: &ToolCall,
    result: &ToolResultMessage,
    context: &SharedContext,
    config: &Arc<AgentConfig>,
    adapter: &Arc<dyn StreamAdapter>,
    cancel: &CancellationToken,
    sink: &RunSink,
    new_messages: &mut Vec<Message>,
) {
    for advisor in &config.advisors {
        run_one(
            advisor,
            call,
            result,
            context,
            config,
            adapter,
            cancel,
            sink,
            new_messages,
        )
        .await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_one(
    advisor: &Arc<AdvisorConfig>,
    call: &ToolCall,
    result: &ToolResultMessage,
    context: &SharedContext,
    parent: &Arc<AgentConfig>,
    adapter: &Arc<dyn StreamAdapter>,
    cancel: &CancellationToken,
    sink: &RunSink,
    new_messages: &mut Vec<Message>,
) {
    let params = TriggerParams {
        messages: context.lock().await.messages.clone(),
        tool_name: call.name.clone(),
        tool_args: Value::Object(call.arguments.clone()),
        tool_result: result.clone(),
    };

    match (advisor.trigger)(params.clone()).await {
        Ok(false) => return,
        Ok(true) => {}
        Err(e) => {
            warn!(advisor = %advisor.name, error = %e, "advisor trigger failed");
            sink.push(AgentEvent::AdvisorError {
                advisor_name: advisor.name.clone(),
                error: e.to_string(),
            });
            return;
        }
    }

    debug!(advisor = %advisor.name, tool_name = %call.name, "advisor triggered");
    sink.push(AgentEvent::AdvisorStart {
        advisor_name: advisor.name.clone(),
        tool_name: call.name.clone(),
    });

    let seed = match (advisor.create_context)(params).await {
        Ok(seed) => seed,
        Err(e) => {
            warn!(advisor = %advisor.name, error = %e, "advisor context factory failed");
            sink.push(AgentEvent::AdvisorError {
                advisor_name: advisor.name.clone(),
                error: e.to_string(),
            });
            return;
        }
    };

    // Nested run: fresh context, empty log, the seed messages as prompts.
    let child_context = AgentContext {
        system_prompt: seed.system_prompt,
        messages: Vec::new(),
        tools: ToolRegistry::from_tools(advisor.tools.iter().cloned()),
    }
    .shared();
    let child_config = Arc::new(child_config_for(advisor, parent));

    let mut child_stream = agent::start(
        seed.messages,
        child_context,
        child_config,
        adapter.clone(),
        cancel.clone(),
    );

    // Forward every child event to the parent stream, remembering whether
    // the child run ended in failure.
    let mut child_error: Option<String> = None;
    while let Some(event) = child_stream.next().await {
        if let AgentEvent::AgentEnd { error: Some(e), .. } = &event {
            child_error = Some(e.clone());
        }
        sink.push(AgentEvent::AdvisorEvent {
            advisor_name: advisor.name.clone(),
            event: Box::new(event),
        });
    }
    let child_messages = child_stream.result().await.unwrap_or_default();

    if let Some(error) = child_error {
        warn!(advisor = %advisor.name, error = %error, "advisor run failed");
        sink.push(AgentEvent::AdvisorError {
            advisor_name: advisor.name.clone(),
            error,
        });
        return;
    }

    let content = match &advisor.extract_result {
        Some(extract) => extract(child_messages).await,
        None => default_extract_result(&child_messages),
    };

    if !content.is_empty() {
        let message = Message::Advisor(AdvisorMessage {
            advisor_name: advisor.name.clone(),
            content: content.clone(),
            model: advisor.model.clone(),
            timestamp: now_ms(),
        });
        context.lock().await.messages.push(message.clone());
        new_messages.push(message.clone());
        sink.push(AgentEvent::MessageStart {
            message: message.clone(),
        });
        sink.push(AgentEvent::MessageEnd { message });
    }

    info!(advisor = %advisor.name, injected = !content.is_empty(), "advisor completed");
    sink.push(AgentEvent::AdvisorEnd {
        advisor_name: advisor.name.clone(),
        content,
    });
}

/// Build the child run's config. Credentials fall back to the parent's
/// when the advisor declares neither a key nor a resolver.
fn child_config_for(advisor: &Arc<AdvisorConfig>, parent: &Arc<AgentConfig>) -> AgentConfig {
    let (api_key, get_api_key) = if advisor.api_key.is_none() && advisor.get_api_key.is_none() {
        (parent.api_key.clone(), parent.get_api_key.clone())
    } else {
        (advisor.api_key.clone(), advisor.get_api_key.clone())
    };

    AgentConfig {
        model: advisor.model.clone(),
        convert_to_llm: advisor
            .convert_to_llm
            .clone()
            .unwrap_or_else(default_convert_to_llm),
        transform_context: None,
        api_key,
        get_api_key,
        get_steering_messages: None,
        get_follow_up_messages: None,
        advisors: advisor.advisors.clone(),
        reasoning: advisor.reasoning,
        max_turns: parent.max_turns,
        queue: MessageQueue::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_core::content::AssistantContent;
    use tiller_core::messages::{AssistantMessage, StopReason, TokenUsage};

    fn assistant(content: Vec<AssistantContent>) -> Message {
        Message::Assistant(AssistantMessage {
            content,
            stop_reason: StopReason::Stop,
            error_message: None,
            model: "test-model".into(),
            usage: TokenUsage::default(),
            timestamp: 0,
        })
    }

    fn params(tool_name: &str) -> TriggerParams {
        TriggerParams {
            messages: vec![],
            tool_name: tool_name.into(),
            tool_args: Value::Object(serde_json::Map::new()),
            tool_result: ToolResultMessage {
                tool_call_id: "tc-1".into(),
                tool_name: tool_name.into(),
                content: vec![],
                details: None,
                is_error: false,
                timestamp: 0,
            },
        }
    }

    #[tokio::test]
    async fn on_tools_matches_by_name() {
        let trigger = on_tools(["echo", "bash"]);
        assert!(trigger(params("echo")).await.unwrap());
        assert!(trigger(params("bash")).await.unwrap());
        assert!(!trigger(params("read")).await.unwrap());
    }

    #[test]
    fn default_extract_uses_last_assistant_text() {
        let messages = vec![
            assistant(vec![AssistantContent::text("first")]),
            Message::user("between"),
            assistant(vec![
                AssistantContent::thinking("hmm"),
                AssistantContent::text("line one"),
                AssistantContent::text("line two"),
            ]),
        ];
        assert_eq!(default_extract_result(&messages), "line one\nline two");
    }

    #[test]
    fn default_extract_empty_without_assistant() {
        assert_eq!(default_extract_result(&[Message::user("hi")]), "");
    }

    #[test]
    fn child_config_inherits_parent_credentials() {
        let mut parent = AgentConfig::new("parent-model", default_convert_to_llm());
        parent.api_key = Some("parent-key".into());
        let parent = Arc::new(parent);

        let advisor = Arc::new(AdvisorConfig::new(
            "reviewer",
            "advisor-model",
            on_tools(["echo"]),
            Arc::new(|_| Box::pin(async { Ok(AdvisorSeed::default()) })),
        ));

        let child = child_config_for(&advisor, &parent);
        assert_eq!(child.model, "advisor-model");
        assert_eq!(child.api_key.as_deref(), Some("parent-key"));
    }

    #[test]
    fn child_config_prefers_own_credentials() {
        let mut parent = AgentConfig::new("parent-model", default_convert_to_llm());
        parent.api_key = Some("parent-key".into());
        let parent = Arc::new(parent);

        let mut advisor = AdvisorConfig::new(
            "reviewer",
            "advisor-model",
            on_tools(["echo"]),
            Arc::new(|_| Box::pin(async { Ok(AdvisorSeed::default()) })),
        );
        advisor.api_key = Some("advisor-key".into());
        let advisor = Arc::new(advisor);

        let child = child_config_for(&advisor, &parent);
        assert_eq!(child.api_key.as_deref(), Some("advisor-key"));
    }
}
