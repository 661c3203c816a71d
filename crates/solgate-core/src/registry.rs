//! ============================================================================
//! Tool Registry - Uniform mounting point for agent tools
//! ============================================================================
//! The surrounding agent framework addresses tools by name and speaks only
//! the result envelope. Unknown tools come back as error envelopes, never
//! as panics or propagated errors.
//! ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::ToolResult;

/// An agent tool: a named action dispatcher with a uniform envelope
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(&self, action: &str, params: &Value) -> ToolResult;
}

/// Description entry returned by `list`
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Registry of available tools
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.write().await.insert(name.clone(), tool);
        debug!("Registered tool: {}", name);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    pub async fn list(&self) -> Vec<ToolInfo> {
        let mut info: Vec<ToolInfo> = self
            .tools
            .read()
            .await
            .values()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect();
        info.sort_by(|a, b| a.name.cmp(&b.name));
        info
    }

    /// Execute an action on a named tool, wrapping a missing tool in the
    /// same envelope the tools themselves use
    pub async fn execute(&self, tool_name: &str, action: &str, params: &Value) -> ToolResult {
        match self.get(tool_name).await {
            Some(tool) => tool.execute(action, params).await,
            None => ToolResult::error(format!("Tool not found: {}", tool_name)),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its parameters"
        }

        async fn execute(&self, action: &str, params: &Value) -> ToolResult {
            ToolResult::success(json!({"action": action, "params": params}))
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await;

        assert!(registry.has("echo").await);
        let result = registry.execute("echo", "ping", &json!({"x": 1})).await;
        assert!(result.is_success());
        assert_eq!(result.result.unwrap()["action"], "ping");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_envelope() {
        let registry = ToolRegistry::new();
        let result = registry.execute("missing", "ping", &json!({})).await;
        assert!(!result.is_success());
        assert_eq!(result.error.unwrap(), "Tool not found: missing");
    }

    #[tokio::test]
    async fn test_list() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).await;
        let tools = registry.list().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
    }
}
