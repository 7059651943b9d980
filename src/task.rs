//! High-level objectives bundled with task-scoped context.

use crate::agent::Agent;
use crate::context::ContextMap;
use crate::errors::AgentResult;

/// A structured goal handed off to an agent for execution.
///
/// Context added to the task is recorded locally and synchronized with the
/// agent, so the agent's system instructions carry it for every turn of the
/// task.
pub struct Task<'a> {
    agent: &'a mut Agent,
    context: ContextMap,
}

impl<'a> Task<'a> {
    pub fn new(agent: &'a mut Agent) -> Self {
        Self {
            agent,
            context: ContextMap::new(),
        }
    }

    /// Register a context item for this task and forward it to the agent
    pub fn add_context<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        self.context.insert(key.clone(), value.clone());
        self.agent.add_context(key, value);
    }

    /// Render the goal into a structured prompt and route it to the agent
    pub async fn execute(&mut self, goal: &str) -> AgentResult<String> {
        let mut prompt =
            String::from("Please fulfill the following task based on the provided context:\n");
        if !goal.is_empty() {
            prompt.push_str(&format!("Goal: {}\n", goal));
        }

        self.agent.chat(&prompt).await
    }
}
