// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::graph::node::{Node, NodeResult};
use crate::graph::state::{WorkflowState, ERROR};
use crate::kit::error::{BoxError, ErrorCategory};
use crate::kit::message::Message;

/// Turns an error marker into a user-visible apology
///
/// Appends one assistant message chosen by the marker's category and clears
/// the marker. It never fails; the engine always routes it to terminal.
#[derive(Debug, Clone, Default)]
pub struct ErrorNode {
    overrides: HashMap<ErrorCategory, String>,
}

impl ErrorNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fixed message for one category
    pub fn with_message(mut self, category: ErrorCategory, message: impl Into<String>) -> Self {
        self.overrides.insert(category, message.into());
        self
    }

    pub fn message_for(&self, category: ErrorCategory) -> &str {
        self.overrides
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.user_message())
    }
}

#[async_trait]
impl Node for ErrorNode {
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        let category = match state.error_marker() {
            Some(marker) => {
                log::warn!(
                    "Recovering from {} failure (node: {}): {}",
                    marker.category,
                    marker.node.as_deref().unwrap_or("-"),
                    marker.detail
                );
                marker.category
            }
            None => ErrorCategory::Unclassified,
        };

        Ok(NodeResult::new()
            .message(Message::assistant(self.message_for(category)))
            .set(ERROR, Value::Null))
    }
}
