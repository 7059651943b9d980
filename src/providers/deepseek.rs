use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider};
use super::configs::DeepSeekProviderConfig;
use super::sse::collect_openai_stream;
use super::utils::{
    check_error_payload, messages_to_openai_spec, openai_response_to_completion,
    tools_to_openai_spec,
};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub const DEEPSEEK_HOST: &str = "https://api.deepseek.com";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

pub struct DeepSeekProvider {
    client: Client,
    config: DeepSeekProviderConfig,
}

impl DeepSeekProvider {
    pub fn new(config: DeepSeekProviderConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn build_payload(
        &self,
        messages: &[Message],
        tools: &[Tool],
        stream: bool,
    ) -> AgentResult<Value> {
        // DeepSeek wants the stream flag stated either way
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
            "stream": stream,
        });

        let tools_spec = tools_to_openai_spec(tools)?;
        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        Ok(payload)
    }

    async fn post_raw(&self, payload: &Value) -> AgentResult<reqwest::Response> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AgentError::Provider(format!(
                    "DeepSeek request failed: {}: {}",
                    status, body
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for DeepSeekProvider {
    async fn send(&self, messages: &[Message], tools: &[Tool]) -> AgentResult<Completion> {
        let payload = self.build_payload(messages, tools, false)?;
        let data: Value = self
            .post_raw(&payload)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid JSON response: {}", e)))?;
        check_error_payload(&data, "DeepSeek")?;
        openai_response_to_completion(data)
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[Tool],
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> AgentResult<Completion> {
        let payload = self.build_payload(messages, tools, true)?;
        let response = self.post_raw(&payload).await?;
        collect_openai_stream(response, on_token).await
    }
}
