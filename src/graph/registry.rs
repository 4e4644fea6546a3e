// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::kit::tool::Tool;

/// Where the tool node looks tools up by name
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>>;
}

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry pre-populated with the given tools
    pub async fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let registry = Self::new();
        for tool in tools {
            registry.register(tool).await;
        }
        registry
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().await;
        if tools.insert(tool.name().to_string(), tool.clone()).is_some() {
            log::warn!("Tool '{}' re-registered; previous definition replaced", tool.name());
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }

    /// All tools, sorted by name, for advertising to a model
    pub async fn list(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        let mut list: Vec<Arc<dyn Tool>> = tools.values().cloned().collect();
        list.sort_by(|a, b| a.name().cmp(b.name()));
        list
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolBackend for ToolRegistry {
    async fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.get(name).await
    }
}
