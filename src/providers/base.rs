use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AgentResult;
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// The vendor-independent response shape all providers produce.
///
/// An empty `tool_calls` list is the orchestration loop's sole terminal
/// signal for a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    /// Create a plain-text completion
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Base trait for AI providers (Groq, OpenAI, Anthropic, etc)
///
/// Providers receive the full outbound message list, system messages
/// included; vendors that want the system instruction as a separate field
/// extract it themselves.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the conversation and return the completed turn
    async fn send(&self, messages: &[Message], tools: &[Tool]) -> AgentResult<Completion>;

    /// Send the conversation, invoking `on_token` synchronously for each
    /// text delta as it arrives, and return the completed turn.
    ///
    /// Providers without a native streaming mode simulate it: they perform
    /// the blocking call and invoke `on_token` once with the whole content,
    /// so the callback fires at least once whenever content is non-empty.
    /// Streamed turns may omit tool calls.
    async fn stream(
        &self,
        messages: &[Message],
        tools: &[Tool],
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> AgentResult<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn test_usage_creation() {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        assert_eq!(usage.input_tokens, Some(10));
        assert_eq!(usage.output_tokens, Some(20));
        assert_eq!(usage.total_tokens, Some(30));
    }

    #[test]
    fn test_completion_serialization() -> Result<()> {
        let completion = Completion::text("Hello")
            .with_tool_calls(vec![ToolCall::new("1", "echo", "{}")])
            .with_usage(Usage::new(Some(10), Some(20), Some(30)));

        let serialized = serde_json::to_string(&completion)?;
        let deserialized: Completion = serde_json::from_str(&serialized)?;
        assert_eq!(completion, deserialized);

        let json_value: serde_json::Value = serde_json::from_str(&serialized)?;
        assert_eq!(json_value["content"], json!("Hello"));
        assert_eq!(json_value["tool_calls"][0]["name"], json!("echo"));
        Ok(())
    }

    #[test]
    fn test_empty_tool_calls_is_terminal() {
        assert!(!Completion::text("done").has_tool_calls());
        assert!(Completion::text("")
            .with_tool_calls(vec![ToolCall::new("1", "echo", "{}")])
            .has_tool_calls());
    }
}
