use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Completion, Provider};
use super::configs::OpenRouterProviderConfig;
use super::sse::collect_openai_stream;
use super::utils::{
    check_error_payload, messages_to_openai_spec, openai_response_to_completion,
    tools_to_openai_spec,
};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub const OPENROUTER_HOST: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterProviderConfig,
}

impl OpenRouterProvider {
    pub fn new(config: OpenRouterProviderConfig) -> AgentResult<Self> {
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
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });

        let tools_spec = tools_to_openai_spec(tools)?;
        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }
        if stream {
            payload["stream"] = json!(true);
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        Ok(payload)
    }

    /// Ranking headers are only sent when configured
    fn apply_ranking_headers(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(site_url) = &self.config.site_url {
            request = request.header("HTTP-Referer", site_url);
        }
        if let Some(app_name) = &self.config.app_name {
            request = request.header("X-Title", app_name);
        }
        request
    }

    async fn post_raw(&self, payload: &Value) -> AgentResult<reqwest::Response> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key));

        let response = self
            .apply_ranking_headers(request)
            .json(payload)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AgentError::Provider(format!(
                    "OpenRouter request failed: {}: {}",
                    status, body
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    async fn send(&self, messages: &[Message], tools: &[Tool]) -> AgentResult<Completion> {
        let payload = self.build_payload(messages, tools, false)?;
        let data: Value = self
            .post_raw(&payload)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid JSON response: {}", e)))?;
        check_error_payload(&data, "OpenRouter")?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_with_ranking_headers() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("HTTP-Referer", "https://example.com"))
            .and(header("X-Title", "nanoagent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "Routed"}
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = OpenRouterProviderConfig::new("test_api_key");
        config.host = mock_server.uri();
        config.site_url = Some("https://example.com".to_string());
        config.app_name = Some("nanoagent".to_string());
        let provider = OpenRouterProvider::new(config)?;

        let completion = provider.send(&[Message::user("Hi")], &[]).await?;
        assert_eq!(completion.content, "Routed");
        Ok(())
    }

    #[tokio::test]
    async fn test_error_payload() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"message": "no credits"}
            })))
            .mount(&mock_server)
            .await;

        let mut config = OpenRouterProviderConfig::new("test_api_key");
        config.host = mock_server.uri();
        let provider = OpenRouterProvider::new(config)?;

        let result = provider.send(&[Message::user("Hi")], &[]).await;
        assert!(matches!(result, Err(AgentError::Provider(detail)) if detail.contains("no credits")));
        Ok(())
    }
}
