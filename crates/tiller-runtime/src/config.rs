//! Run configuration: the model handle, the LLM projection, rotating
//! credentials, and the steering / follow-up message hooks.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use tiller_core::messages::Message;
use tiller_llm::adapter::ReasoningLevel;

use crate::advisor::AdvisorConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Hook type aliases
// ─────────────────────────────────────────────────────────────────────────────

/// Projects the full message log into the subset the LLM understands.
///
/// Called on every LLM request with a snapshot of the log. Extension and
/// advisor messages are interpreted (or dropped) here; the persistent log
/// is untouched.
pub type LlmProjection =
    Arc<dyn Fn(Vec<Message>) -> BoxFuture<'static, Vec<Message>> + Send + Sync>;

/// Log-level projection (e.g. pruning) applied before the LLM projection.
pub type ContextTransform =
    Arc<dyn Fn(Vec<Message>) -> BoxFuture<'static, Vec<Message>> + Send + Sync>;

/// Resolves a possibly-rotating API key. Called with the model handle
/// before every LLM request; never cached across calls.
pub type ApiKeyResolver =
    Arc<dyn Fn(String) -> BoxFuture<'static, Option<String>> + Send + Sync>;

/// Async fetcher for queued user messages (steering or follow-up).
///
/// Caller contract: a fetch discharges the queue; fetching again at the
/// same loop position returns nothing.
pub type MessageFetcher = Arc<dyn Fn() -> BoxFuture<'static, Vec<Message>> + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Message queue
// ─────────────────────────────────────────────────────────────────────────────

/// In-loop queue for steering and follow-up messages.
///
/// A clone-able handle embedders can push into without wiring a fetcher.
/// The loop drains it at the same delivery boundaries as the fetchers
/// (queue first, then fetcher).
#[derive(Clone, Default)]
pub struct MessageQueue {
    inner: Arc<Mutex<QueueInner>>,
}

#[derive(Default)]
struct QueueInner {
    steering: VecDeque<Message>,
    follow_up: VecDeque<Message>,
}

impl MessageQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a steering message (delivered at the next interrupt boundary).
    pub fn push_steering(&self, message: Message) {
        self.inner.lock().steering.push_back(message);
    }

    /// Queue a follow-up message (delivered when the run would otherwise stop).
    pub fn push_follow_up(&self, message: Message) {
        self.inner.lock().follow_up.push_back(message);
    }

    /// Drain all queued steering messages.
    #[must_use]
    pub fn pop_steering(&self) -> Vec<Message> {
        self.inner.lock().steering.drain(..).collect()
    }

    /// Drain all queued follow-up messages.
    #[must_use]
    pub fn pop_follow_up(&self) -> Vec<Message> {
        self.inner.lock().follow_up.drain(..).collect()
    }

    /// Count of queued messages (steering + follow-up).
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.steering.len() + inner.follow_up.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for an agent run.
#[derive(Clone)]
pub struct AgentConfig {
    /// Model handle passed to the streaming adapter.
    pub model: String,
    /// Required LLM projection of the message log.
    pub convert_to_llm: LlmProjection,
    /// Optional log-level projection applied before `convert_to_llm`.
    pub transform_context: Option<ContextTransform>,
    /// Static API key, used when `get_api_key` is absent or returns `None`.
    pub api_key: Option<String>,
    /// Per-call API key resolver.
    pub get_api_key: Option<ApiKeyResolver>,
    /// Polled before each LLM call and after each tool result.
    pub get_steering_messages: Option<MessageFetcher>,
    /// Polled when the run would otherwise stop.
    pub get_follow_up_messages: Option<MessageFetcher>,
    /// Advisor sub-agents fired after tool results.
    pub advisors: Vec<Arc<AdvisorConfig>>,
    /// Reasoning level forwarded to the adapter.
    pub reasoning: Option<ReasoningLevel>,
    /// Safety valve: maximum tool-running turns before the run stops with
    /// an error. `None` (default) means unbounded.
    pub max_turns: Option<usize>,
    /// In-loop message queue, drained alongside the fetchers.
    pub queue: MessageQueue,
}

impl AgentConfig {
    /// Create a config with the required options; everything else off.
    #[must_use]
    pub fn new(model: impl Into<String>, convert_to_llm: LlmProjection) -> Self {
        Self {
            model: model.into(),
            convert_to_llm,
            transform_context: None,
            api_key: None,
            get_api_key: None,
            get_steering_messages: None,
            get_follow_up_messages: None,
            advisors: Vec::new(),
            reasoning: None,
            max_turns: None,
            queue: MessageQueue::new(),
        }
    }

    /// Resolve the API key for the next LLM call.
    ///
    /// The resolver is awaited fresh on every call so expiring tokens stay
    /// valid through long tool phases; the static key is the fallback.
    pub(crate) async fn resolve_api_key(&self) -> Option<String> {
        if let Some(resolver) = &self.get_api_key {
            if let Some(key) = resolver(self.model.clone()).await {
                return Some(key);
            }
        }
        self.api_key.clone()
    }

    /// Drain steering messages: queue first, then the fetcher.
    pub(crate) async fn drain_steering(&self) -> Vec<Message> {
        let mut messages = self.queue.pop_steering();
        if let Some(fetch) = &self.get_steering_messages {
            messages.extend(fetch().await);
        }
        messages
    }

    /// Drain follow-up messages: queue first, then the fetcher.
    pub(crate) async fn drain_follow_up(&self) -> Vec<Message> {
        let mut messages = self.queue.pop_follow_up();
        if let Some(fetch) = &self.get_follow_up_messages {
            messages.extend(fetch().await);
        }
        messages
    }
}
