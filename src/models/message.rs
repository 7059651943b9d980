use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message to or from an LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub created: i64,
    /// Text content; absent for assistant turns that only request tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool invocations requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool-role messages, the id of the call this message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool-role messages, the name of the tool that produced the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    fn new(role: Role, content: Option<String>) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system<S: Into<String>>(text: S) -> Self {
        Self::new(Role::System, Some(text.into()))
    }

    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User, Some(text.into()))
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self::new(Role::Assistant, Some(text.into()))
    }

    /// Create a tool-result message answering the call with the given id
    pub fn tool<I, N, S>(tool_call_id: I, tool_name: N, content: S) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut message = Self::new(Role::Tool, Some(content.into()));
        message.tool_call_id = Some(tool_call_id.into());
        message.tool_name = Some(tool_name.into());
        message
    }

    /// Attach tool invocations to the message
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// The text content, or an empty string if there is none
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
