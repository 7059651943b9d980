use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::base::{Completion, Provider};
use crate::errors::AgentResult;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A mock provider that returns pre-configured responses, for testing and
/// development without real API calls.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Completion>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Completion>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn send(&self, _messages: &[Message], _tools: &[Tool]) -> AgentResult<Completion> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok(Completion::default())
        } else {
            Ok(responses.remove(0))
        }
    }

    /// Simulated streaming: the full content arrives in one callback
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
