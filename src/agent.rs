use serde_json::Value;

use crate::context::{build_system_prompt, ContextMap};
use crate::errors::{AgentError, AgentResult};
use crate::events::{ActivityLog, AgentEvent, EventObserver};
use crate::models::message::Message;
use crate::models::tool::ToolCall;
use crate::providers::base::Provider;
use crate::providers::configs::ProviderConfig;
use crate::providers::factory::get_provider;
use crate::registry::{ToolHandler, ToolRegistry};
use std::sync::Arc;

/// Agent pairs an LLM provider with a conversation, a tool registry, and
/// injected context, and drives the request/tool-execution loop.
///
/// Each agent owns its conversation exclusively. The loop is strictly
/// sequential: one provider call in flight, tool calls executed one at a
/// time in the order the provider returned them.
pub struct Agent {
    provider: Box<dyn Provider + Send + Sync>,
    system_prompt: String,
    context: ContextMap,
    tools: ToolRegistry,
    history: Vec<Message>,
    observer: Option<Box<dyn EventObserver>>,
    activity_log: Option<Arc<ActivityLog>>,
}

impl Agent {
    /// Create a new Agent with the specified provider and base instructions
    pub fn new<S: Into<String>>(provider: Box<dyn Provider + Send + Sync>, system_prompt: S) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            context: ContextMap::new(),
            tools: ToolRegistry::new(),
            history: Vec::new(),
            observer: None,
            activity_log: None,
        }
    }

    /// Create an Agent by resolving the provider from a configuration
    pub fn from_config<S: Into<String>>(
        config: ProviderConfig,
        system_prompt: S,
    ) -> AgentResult<Self> {
        Ok(Self::new(get_provider(config)?, system_prompt.into()))
    }

    /// Add a labeled piece of context injected into the system instructions
    pub fn add_context<L: Into<String>, C: Into<String>>(&mut self, label: L, content: C) {
        self.context.insert(label, content);
    }

    pub fn remove_context(&mut self, label: &str) {
        self.context.remove(label);
    }

    pub fn clear_context(&mut self) {
        self.context.clear();
    }

    /// Add a new tool capability to the agent
    pub fn register_tool(&mut self, tool: Box<dyn ToolHandler>) {
        self.tools.register(tool);
    }

    /// Attach an observer notified of every lifecycle event
    pub fn set_observer(&mut self, observer: Box<dyn EventObserver>) {
        self.observer = Some(observer);
    }

    /// Record lifecycle events into a built-in in-memory activity log
    pub fn enable_activity_logging(&mut self) {
        let log = Arc::new(ActivityLog::new());
        let sink = log.clone();
        self.observer = Some(Box::new(move |event: &AgentEvent| sink.on_event(event)));
        self.activity_log = Some(log);
    }

    /// Readable lines from the built-in activity log, if enabled
    pub fn activity_log(&self) -> Vec<String> {
        self.activity_log
            .as_ref()
            .map(|log| log.messages())
            .unwrap_or_default()
    }

    /// Access the current conversation history
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Overwrite/restore the conversation history
    pub fn set_history(&mut self, history: Vec<Message>) {
        self.history = history;
    }

    /// Clear all messages from the conversation history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    fn build_request(&self) -> Vec<Message> {
        let system_prompt = build_system_prompt(&self.system_prompt, &self.context);
        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(self.history.iter().cloned());
        messages
    }

    /// Execute a chat round: send the user message and loop through any
    /// requested tool executions until the provider answers in plain text.
    ///
    /// No bound is placed on the number of tool round-trips; a model and
    /// tool pair that keep requesting each other will keep looping.
    pub async fn chat(&mut self, message: &str) -> AgentResult<String> {
        self.history.push(Message::user(message));
        self.emit(AgentEvent::UserMessage {
            content: message.to_string(),
        });

        loop {
            let messages = self.build_request();
            let tools = self.tools.definitions();

            self.emit(AgentEvent::RequestStart {
                tool_count: tools.len(),
            });
            tracing::debug!(tools = tools.len(), turns = self.history.len(), "requesting completion");

            let completion = self.provider.send(&messages, &tools).await?;
            self.emit(AgentEvent::RequestEnd {
                completion: completion.clone(),
            });

            let mut assistant = Message::assistant(completion.content.clone());
            if completion.has_tool_calls() {
                assistant = assistant.with_tool_calls(completion.tool_calls.clone());
            }
            self.history.push(assistant);

            // No tools requested means we have the final answer
            if !completion.has_tool_calls() {
                return Ok(completion.content);
            }

            for call in &completion.tool_calls {
                let output = self.run_tool(call).await;
                self.history
                    .push(Message::tool(call.id.clone(), call.name.clone(), output.clone()));
                self.emit(AgentEvent::ToolEnd {
                    name: call.name.clone(),
                    output,
                });
            }
        }
    }

    /// Stream a chat response, invoking `on_token` for each text delta.
    ///
    /// Streamed turns are a single round: tool calls are not executed, and
    /// the aggregated content is recorded as the assistant's reply.
    pub async fn stream<F>(&mut self, message: &str, mut on_token: F) -> AgentResult<String>
    where
        F: FnMut(&str) + Send,
    {
        self.history.push(Message::user(message));
        self.emit(AgentEvent::UserMessage {
            content: message.to_string(),
        });

        let messages = self.build_request();
        let tools = self.tools.definitions();

        self.emit(AgentEvent::StreamStart);
        let completion = self.provider.stream(&messages, &tools, &mut on_token).await?;
        self.emit(AgentEvent::StreamEnd {
            completion: completion.clone(),
        });

        self.history.push(Message::assistant(completion.content.clone()));
        Ok(completion.content)
    }

    /// Run one requested tool call, converting every failure into a textual
    /// result so the model can reason about it instead of crashing the loop.
    async fn run_tool(&self, call: &ToolCall) -> String {
        let decoded: Result<Value, _> = serde_json::from_str(&call.arguments);

        self.emit(AgentEvent::ToolStart {
            name: call.name.clone(),
            arguments: decoded.as_ref().ok().cloned().unwrap_or(Value::Null),
        });
        tracing::debug!(tool = %call.name, "executing tool");

        let arguments = match decoded {
            Ok(arguments) => arguments,
            Err(e) => return format!("Error executing tool: invalid arguments JSON: {}", e),
        };

        match self.tools.execute(&call.name, arguments).await {
            Ok(Value::String(text)) => text,
            Ok(result) => result.to_string(),
            Err(AgentError::ToolNotFound(name)) => format!("Tool not found: {}", name),
            Err(AgentError::ToolExecution(detail)) => format!("Error executing tool: {}", detail),
            Err(e) => format!("Error executing tool: {}", e),
        }
    }
}
