use regex::Regex;
use serde_json::{json, Value};

use super::base::{Completion, Usage};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, Role};
use crate::models::tool::{Tool, ToolCall};

/// Convert internal messages to the OpenAI chat-completion wire shape.
///
/// The same shape is accepted by every OpenAI-compatible vendor (Groq,
/// DeepSeek, OpenRouter), so those adapters all share this codec.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };

        let mut converted = json!({
            "role": role,
            "content": message.content,
        });

        if message.has_tool_calls() {
            let tool_calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": sanitize_function_name(&call.name),
                            "arguments": call.arguments,
                        }
                    })
                })
                .collect();
            converted["tool_calls"] = json!(tool_calls);
        }

        if let Some(id) = &message.tool_call_id {
            converted["tool_call_id"] = json!(id);
        }
        if let Some(name) = &message.tool_name {
            converted["name"] = json!(name);
        }

        messages_spec.push(converted);
    }

    messages_spec
}

/// Convert internal Tool definitions to OpenAI's tool declaration shape
pub fn tools_to_openai_spec(tools: &[Tool]) -> AgentResult<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(AgentError::InvalidParameters(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Split the system instruction out of the outbound message list.
///
/// Used by vendors that take the system prompt as a separate top-level
/// field: all system-role messages are newline-joined in original order and
/// removed from the thread.
pub fn split_system_messages(messages: &[Message]) -> (String, Vec<&Message>) {
    let mut system_prompt = String::new();
    let mut rest = Vec::new();

    for message in messages {
        if matches!(message.role, Role::System) {
            system_prompt.push_str(message.text());
            system_prompt.push('\n');
        } else {
            rest.push(message);
        }
    }

    (system_prompt.trim().to_string(), rest)
}

/// Translate a vendor "error" payload into a provider error.
///
/// A response carrying one must never surface as a successful completion;
/// the raw payload travels along as diagnostic detail.
pub fn check_error_payload(response: &Value, vendor: &str) -> AgentResult<()> {
    if let Some(error) = response.get("error") {
        return Err(AgentError::Provider(format!(
            "{} API error: {}",
            vendor, error
        )));
    }
    Ok(())
}

/// Convert an OpenAI-style chat-completion response to the normalized shape
pub fn openai_response_to_completion(response: Value) -> AgentResult<Completion> {
    let message = response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| {
            AgentError::Provider(format!("missing choices in response: {}", response))
        })?;

    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for call in calls {
            let id = call["id"].as_str().unwrap_or_default().to_string();
            let name = call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            tool_calls.push(ToolCall::new(id, name, arguments));
        }
    }

    Ok(Completion {
        content,
        tool_calls,
        usage: get_usage(&response),
    })
}

/// Extract token usage where the vendor reports it; absent fields stay None
pub fn get_usage(data: &Value) -> Usage {
    let usage = match data.get("usage") {
        Some(usage) => usage,
        None => return Usage::default(),
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

pub fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    re.replace_all(name, "_").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const OPENAI_TOOL_USE_RESPONSE: &str = r#"{
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "example_fn",
                        "arguments": "{\"param\": \"value\"}"
                    }
                }]
            }
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 25,
            "total_tokens": 35
        }
    }"#;

    #[test]
    fn test_messages_to_openai_spec() {
        let messages = vec![
            Message::system("Be helpful"),
            Message::user("Hello"),
            Message::assistant("").with_tool_calls(vec![ToolCall::new(
                "call_1",
                "echo",
                r#"{"message":"hi"}"#,
            )]),
            Message::tool("call_1", "echo", "hi"),
        ];

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 4);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[1]["content"], "Hello");
        assert_eq!(spec[2]["tool_calls"][0]["function"]["name"], "echo");
        assert_eq!(
            spec[2]["tool_calls"][0]["function"]["arguments"],
            r#"{"message":"hi"}"#
        );
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(spec[3]["tool_call_id"], "call_1");
        assert_eq!(spec[3]["name"], "echo");
    }

    #[test]
    fn test_tools_to_openai_spec() -> Result<()> {
        let tool = Tool::new(
            "test_tool",
            "A test tool",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "input": {"type": "string"}
                },
                "required": ["input"]
            }),
        );

        let spec = tools_to_openai_spec(&[tool])?;

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "test_tool");
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool = Tool::new("dup", "A tool", serde_json::json!({"type": "object"}));
        let result = tools_to_openai_spec(&[tool.clone(), tool]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate tool name"));
    }

    #[test]
    fn test_split_system_messages() {
        let messages = vec![
            Message::system("First."),
            Message::user("Hello"),
            Message::system("Second."),
        ];

        let (system, rest) = split_system_messages(&messages);
        assert_eq!(system, "First.\nSecond.");
        assert_eq!(rest.len(), 1);
        assert!(matches!(rest[0].role, Role::User));
    }

    #[test]
    fn test_check_error_payload() {
        let ok = serde_json::json!({"choices": []});
        assert!(check_error_payload(&ok, "Groq").is_ok());

        let err = serde_json::json!({"error": {"message": "bad key"}});
        let result = check_error_payload(&err, "Groq");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bad key"));
    }

    #[test]
    fn test_openai_response_to_completion_text() -> Result<()> {
        let response = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello there"
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 25}
        });

        let completion = openai_response_to_completion(response)?;
        assert_eq!(completion.content, "Hello there");
        assert!(!completion.has_tool_calls());
        assert_eq!(completion.usage.total_tokens, Some(35));
        Ok(())
    }

    #[test]
    fn test_openai_response_to_completion_tool_calls() -> Result<()> {
        let response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE)?;
        let completion = openai_response_to_completion(response)?;

        assert_eq!(completion.content, "");
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].id, "call_1");
        assert_eq!(completion.tool_calls[0].name, "example_fn");
        assert_eq!(completion.tool_calls[0].arguments, r#"{"param": "value"}"#);
        Ok(())
    }

    #[test]
    fn test_openai_response_missing_choices() {
        let result = openai_response_to_completion(serde_json::json!({"unexpected": true}));
        assert!(matches!(result, Err(AgentError::Provider(_))));
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("hello-world"), "hello-world");
        assert_eq!(sanitize_function_name("hello world"), "hello_world");
        assert_eq!(sanitize_function_name("hello@world"), "hello_world");
    }
}
