use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider, Usage};
use super::configs::AnthropicProviderConfig;
use super::utils::{check_error_payload, split_system_messages};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, Role};
use crate::models::tool::{Tool, ToolCall};

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const ANTHROPIC_DEFAULT_MAX_TOKENS: i32 = 4096;

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Convert the thread (system messages already removed) to Anthropic's
    /// content-block message shape.
    fn messages_to_anthropic_spec(messages: &[&Message]) -> Vec<Value> {
        let mut anthropic_messages = Vec::new();

        for message in messages {
            match message.role {
                Role::Assistant if message.has_tool_calls() => {
                    let mut blocks = Vec::new();
                    if !message.text().is_empty() {
                        blocks.push(json!({"type": "text", "text": message.text()}));
                    }
                    for call in &message.tool_calls {
                        let input: Value =
                            serde_json::from_str(&call.arguments).unwrap_or(Value::Null);
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": input,
                        }));
                    }
                    anthropic_messages.push(json!({"role": "assistant", "content": blocks}));
                }
                Role::Assistant => {
                    anthropic_messages
                        .push(json!({"role": "assistant", "content": message.text()}));
                }
                // Tool results travel as user-role tool_result blocks
                Role::Tool => {
                    anthropic_messages.push(json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": message.tool_call_id,
                            "content": message.text(),
                        }]
                    }));
                }
                _ => {
                    anthropic_messages.push(json!({"role": "user", "content": message.text()}));
                }
            }
        }

        anthropic_messages
    }

    fn tools_to_anthropic_spec(tools: &[Tool]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.parameters,
                })
            })
            .collect()
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = match data.get("usage") {
            Some(usage) => usage,
            None => return Usage::default(),
        };

        let input_tokens = usage
            .get("input_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let output_tokens = usage
            .get("output_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        };

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    fn response_to_completion(response: Value) -> AgentResult<Completion> {
        let blocks = response
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                AgentError::Provider(format!("invalid response format: {}", response))
            })?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    content.push_str(block.get("text").and_then(|t| t.as_str()).unwrap_or(""));
                }
                Some("tool_use") => {
                    let id = block["id"].as_str().unwrap_or_default().to_string();
                    let name = block["name"].as_str().unwrap_or_default().to_string();
                    let arguments = block
                        .get("input")
                        .map(|input| input.to_string())
                        .unwrap_or_else(|| "{}".to_string());
                    tool_calls.push(ToolCall::new(id, name, arguments));
                }
                _ => {}
            }
        }

        let usage = Self::get_usage(&response);
        Ok(Completion {
            content,
            tool_calls,
            usage,
        })
    }

    async fn post(&self, payload: &Value) -> AgentResult<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(payload)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| AgentError::Provider(format!("invalid JSON response: {}", e))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AgentError::Provider(format!(
                    "Anthropic request failed: {}: {}",
                    status, body
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn send(&self, messages: &[Message], tools: &[Tool]) -> AgentResult<Completion> {
        // The system instruction goes in a separate top-level field
        let (system, rest) = split_system_messages(messages);

        let mut payload = json!({
            "model": self.config.model,
            "messages": Self::messages_to_anthropic_spec(&rest),
            "max_tokens": self.config.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        });

        if !system.is_empty() {
            payload["system"] = json!(system);
        }
        if !tools.is_empty() {
            payload["tools"] = json!(Self::tools_to_anthropic_spec(tools));
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }

        let data = self.post(&payload).await?;
        check_error_payload(&data, "Anthropic")?;
        Self::response_to_completion(data)
    }

    /// Anthropic streaming is simulated: one blocking call, then the whole
    /// content delivered through a single callback invocation.
    async fn stream(
        &self,
        messages: &[Message],
        tools: &[Tool],
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> AgentResult<Completion> {
        let completion = self.send(messages, tools).await?;

        if !completion.content.is_empty() {
            on_token(&completion.content);
        }

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(response_body: Value) -> (MockServer, AnthropicProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test_api_key"))
            .and(header("anthropic-version", ANTHROPIC_API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let mut config = AnthropicProviderConfig::new("test_api_key");
        config.host = mock_server.uri();
        let provider = AnthropicProvider::new(config).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_send_basic() -> Result<()> {
        let response_body = json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{
                "type": "text",
                "text": "Hello! How can I assist you today?"
            }],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 15}
        });

        let (_server, provider) = setup_mock_server(response_body).await;

        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello?"),
        ];
        let completion = provider.send(&messages, &[]).await?;

        assert_eq!(completion.content, "Hello! How can I assist you today?");
        assert!(!completion.has_tool_calls());
        assert_eq!(completion.usage.input_tokens, Some(12));
        assert_eq!(completion.usage.total_tokens, Some(27));
        Ok(())
    }

    #[tokio::test]
    async fn test_send_tool_use() -> Result<()> {
        let response_body = json!({
            "id": "msg_tool",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Let me check."},
                {
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "get_weather",
                    "input": {"location": "San Francisco, CA"}
                }
            ],
            "stop_reason": "tool_use"
        });

        let (_server, provider) = setup_mock_server(response_body).await;

        let tool = Tool::new(
            "get_weather",
            "Gets the current weather for a location",
            json!({
                "type": "object",
                "properties": {"location": {"type": "string"}},
                "required": ["location"]
            }),
        );

        let completion = provider
            .send(&[Message::user("Weather in SF?")], &[tool])
            .await?;

        assert_eq!(completion.content, "Let me check.");
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].id, "toolu_1");
        assert_eq!(completion.tool_calls[0].name, "get_weather");
        assert_eq!(
            serde_json::from_str::<Value>(&completion.tool_calls[0].arguments)?,
            json!({"location": "San Francisco, CA"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_stream_is_simulated_with_single_callback() -> Result<()> {
        let response_body = json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Full answer"}],
            "stop_reason": "end_turn"
        });

        let (_server, provider) = setup_mock_server(response_body).await;

        let mut tokens = Vec::new();
        let completion = provider
            .stream(&[Message::user("Hello?")], &[], &mut |token: &str| {
                tokens.push(token.to_string())
            })
            .await?;

        assert_eq!(tokens, vec!["Full answer"]);
        assert_eq!(completion.content, "Full answer");
        Ok(())
    }

    #[test]
    fn test_messages_to_anthropic_spec_tool_round_trip() {
        let assistant = Message::assistant("").with_tool_calls(vec![ToolCall::new(
            "toolu_1",
            "calculator",
            r#"{"a":5,"b":3}"#,
        )]);
        let tool_result = Message::tool("toolu_1", "calculator", "8");
        let binding = [&assistant, &tool_result];

        let spec = AnthropicProvider::messages_to_anthropic_spec(&binding);

        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0]["content"][0]["type"], "tool_use");
        assert_eq!(spec[0]["content"][0]["input"]["a"], 5);
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[1]["content"][0]["type"], "tool_result");
        assert_eq!(spec[1]["content"][0]["tool_use_id"], "toolu_1");
    }
}
