//! Default LLM projection.

use std::sync::Arc;

use tiller_core::messages::{Message, UserMessageContent};

use crate::config::LlmProjection;

/// The default log → LLM projection.
///
/// Standard messages (user / assistant / tool result) pass through.
/// Advisor messages become synthetic user messages tagged
/// `[Advisor: <name>]`. Extension messages are dropped; callers that use
/// them must supply their own projection.
#[must_use]
pub fn default_convert_to_llm() -> LlmProjection {
    Arc::new(|messages: Vec<Message>| {
        Box::pin(async move {
            messages
                .into_iter()
                .filter_map(|message| match message {
                    Message::User { .. } | Message::Assistant(_) | Message::ToolResult(_) => {
                        Some(message)
                    }
                    Message::Advisor(advisor) => Some(Message::User {
                        content: UserMessageContent::Text(format!(
                            "[Advisor: {}] {}",
                            advisor.advisor_name, advisor.content
                        )),
                        timestamp: advisor.timestamp,
                    }),
                    Message::Extension { .. } => None,
                })
                .collect()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tiller_core::messages::AdvisorMessage;

    #[tokio::test]
    async fn standard_messages_pass_through() {
        let convert = default_convert_to_llm();
        let messages = vec![Message::user("hi")];
        let projected = convert(messages.clone()).await;
        assert_eq!(projected, messages);
    }

    #[tokio::test]
    async fn advisor_becomes_tagged_user_message() {
        let convert = default_convert_to_llm();
        let projected = convert(vec![Message::Advisor(AdvisorMessage {
            advisor_name: "reviewer".into(),
            content: "Looks good!".into(),
            model: "test-model".into(),
            timestamp: 7,
        })])
        .await;

        assert_eq!(projected.len(), 1);
        match &projected[0] {
            Message::User { content, timestamp } => {
                assert_eq!(
                    content,
                    &UserMessageContent::Text("[Advisor: reviewer] Looks good!".into())
                );
                assert_eq!(*timestamp, 7);
            }
            other => panic!("expected user message, got {}", other.role()),
        }
    }

    #[tokio::test]
    async fn extension_messages_dropped() {
        let convert = default_convert_to_llm();
        let projected = convert(vec![
            Message::user("keep"),
            Message::Extension {
                tag: "checkpoint".into(),
                payload: json!({}),
                timestamp: 0,
            },
        ])
        .await;
        assert_eq!(projected.len(), 1);
    }
}
