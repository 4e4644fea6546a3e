// SPDX-License-Identifier: MIT

//! Model module - the LLM trait used by model-backed nodes
//!
//! Implementations live in their own submodules:
//! - [openai] - OpenAI-compatible chat completions

pub mod openai;

use crate::kit::error::BoxError;
use crate::kit::message::Message;
use crate::kit::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Core trait for LLM model implementations
///
/// The returned message is appended to the conversation as-is; a response
/// requesting tools carries `Part::ToolCall` entries.
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Message],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Message, BoxError>;
}
