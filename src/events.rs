//! Lifecycle event notifications for external observers.
//!
//! Events are a pure side channel for logging and UIs; emitting them never
//! affects control flow, and the agent behaves identically with no observer
//! attached.

use std::sync::Mutex;

use serde_json::Value;

use crate::providers::base::Completion;

/// A notification emitted at each orchestration-loop transition.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    UserMessage { content: String },
    RequestStart { tool_count: usize },
    RequestEnd { completion: Completion },
    StreamStart,
    StreamEnd { completion: Completion },
    ToolStart { name: String, arguments: Value },
    ToolEnd { name: String, output: String },
}

/// Observer interface for agent lifecycle events.
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &AgentEvent);
}

impl<F> EventObserver for F
where
    F: Fn(&AgentEvent) + Send + Sync,
{
    fn on_event(&self, event: &AgentEvent) {
        self(event)
    }
}

/// Built-in observer that records events and renders readable activity lines.
#[derive(Default)]
pub struct ActivityLog {
    events: Mutex<Vec<AgentEvent>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in arrival order.
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Human-readable lines for tool and streaming activity.
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                AgentEvent::ToolStart { name, arguments } => {
                    Some(format!("Executing: {} with {}", name, arguments))
                }
                AgentEvent::ToolEnd { name, output } => {
                    Some(format!("Result from {}: {}", name, output))
                }
                AgentEvent::StreamStart => Some("Streaming response started...".to_string()),
                _ => None,
            })
            .collect()
    }
}

impl EventObserver for ActivityLog {
    fn on_event(&self, event: &AgentEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
