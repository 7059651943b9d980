use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// An executable capability the model may request to invoke.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The definition advertised to the model
    fn definition(&self) -> Tool;

    /// Execute the tool with already-decoded arguments
    async fn call(&self, arguments: Value) -> AgentResult<Value>;
}

/// A tool backed by a plain closure.
pub struct FunctionTool {
    definition: Tool,
    handler: Box<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>,
}

impl FunctionTool {
    pub fn new<N, D, F>(name: N, description: D, parameters: Value, handler: F) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            definition: Tool::new(name, description, parameters),
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl ToolHandler for FunctionTool {
    fn definition(&self) -> Tool {
        self.definition.clone()
    }

    async fn call(&self, arguments: Value) -> AgentResult<Value> {
        (self.handler)(arguments).map_err(|e| AgentError::ToolExecution(e.to_string()))
    }
}

/// Registry of tools available to an agent, keyed by name.
///
/// Definitions are listed in registration order. Registering a second tool
/// under an existing name replaces that entry without changing its position.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn ToolHandler>) {
        let name = tool.definition().name;
        match self.tools.iter().position(|t| t.definition().name == name) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.tools
            .iter()
            .find(|t| t.definition().name == name)
            .map(|t| &**t)
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a registered tool by name.
    ///
    /// Failures are returned as values; callers decide whether they are
    /// fatal (the orchestration loop converts them to textual results).
    pub async fn execute(&self, name: &str, arguments: Value) -> AgentResult<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.call(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use serde_json::json;

    fn echo_tool() -> FunctionTool {
        FunctionTool::new(
            "echo",
            "Echoes back the input",
            json!({"type": "object", "properties": {"message": {"type": "string"}}, "required": ["message"]}),
            |args| Ok(json!(args["message"].as_str().unwrap_or(""))),
        )
    }

    #[tokio::test]
    async fn test_register_and_execute() -> Result<()> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(echo_tool()));

        let result = registry.execute("echo", json!({"message": "hi"})).await?;
        assert_eq!(result, json!("hi"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.execute("missing", json!({})).await;
        assert!(matches!(result, Err(AgentError::ToolNotFound(name)) if name == "missing"));
    }

    #[tokio::test]
    async fn test_failing_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FunctionTool::new(
            "broken",
            "Always fails",
            json!({"type": "object", "properties": {}}),
            |_| Err(anyhow!("boom")),
        )));

        let result = registry.execute("broken", json!({})).await;
        assert!(matches!(result, Err(AgentError::ToolExecution(msg)) if msg == "boom"));
    }

    #[test]
    fn test_reregistration_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(echo_tool()));
        registry.register(Box::new(FunctionTool::new(
            "other",
            "Another tool",
            json!({"type": "object", "properties": {}}),
            |_| Ok(json!(null)),
        )));
        registry.register(Box::new(FunctionTool::new(
            "echo",
            "Replacement echo",
            json!({"type": "object", "properties": {}}),
            |_| Ok(json!(null)),
        )));

        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].name, "echo");
        assert_eq!(definitions[0].description, "Replacement echo");
        assert_eq!(definitions[1].name, "other");
    }
}
