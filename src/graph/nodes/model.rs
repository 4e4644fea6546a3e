// SPDX-License-Identifier: MIT

//! Model node - one LLM turn over the conversation history
//!
//! Unlike a self-looping agent, the node makes exactly one model call per
//! execution. Tool calls in the response are left for a [`ToolNode`]
//! (selected by [`tools_condition`]) and the graph's back-edge loops here.
//!
//! [`ToolNode`]: super::ToolNode
//! [`tools_condition`]: super::tools_condition

use async_trait::async_trait;
use std::sync::Arc;

use crate::graph::node::{Node, NodeResult};
use crate::graph::state::WorkflowState;
use crate::kit::error::BoxError;
use crate::kit::message::{Message, Role};
use crate::kit::model::{GenerationConfig, Model};
use crate::kit::tool::Tool;

pub struct ModelNode {
    name: String,
    model: Arc<dyn Model>,
    instruction: Option<String>,
    tools: Vec<Arc<dyn Tool>>,
    config: Option<GenerationConfig>,
}

impl ModelNode {
    pub fn new(name: impl Into<String>, model: Arc<dyn Model>) -> Self {
        Self {
            name: name.into(),
            model,
            instruction: None,
            tools: Vec::new(),
            config: None,
        }
    }

    /// System instruction sent ahead of the history (never stored in state)
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Tools advertised to the model
    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[async_trait]
impl Node for ModelNode {
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        let mut history = Vec::with_capacity(state.message_count() + 1);
        if let Some(instruction) = &self.instruction {
            history.push(Message::system(instruction.clone()));
        }
        history.extend(state.messages()?);

        let tools = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.as_slice())
        };

        log::info!(
            "Model node {} calling model with {} messages",
            self.name,
            history.len()
        );
        let mut response = self
            .model
            .generate_content(&history, self.config.as_ref(), tools)
            .await?;
        response.role = Role::Assistant;

        log::info!(
            "Model node {} received {} parts ({} tool calls)",
            self.name,
            response.parts.len(),
            response.requested_tools().len()
        );
        Ok(NodeResult::new().message(response))
    }
}
