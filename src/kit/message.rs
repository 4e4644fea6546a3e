// SPDX-License-Identifier: MIT

//! Conversation entries stored in the `messages` state field

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Parts of a message - text, tool calls, tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text
    Text { text: String },
    /// A tool the producer wants executed
    ToolCall(ToolCallRequest),
    /// Outcome of executing a requested tool
    ToolResult(ToolCallResult),
}

/// Structured tool invocation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// Outcome of a tool invocation; failures are data, not errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub name: String,
    pub output: Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCallRequest {
    /// Create a request with a fresh call id
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            args,
        }
    }
}

impl ToolCallResult {
    pub fn success(request: &ToolCallRequest, output: Value) -> Self {
        Self {
            call_id: request.id.clone(),
            name: request.name.clone(),
            output,
            is_error: false,
        }
    }

    pub fn failure(request: &ToolCallRequest, error: impl std::fmt::Display) -> Self {
        Self {
            call_id: request.id.clone(),
            name: request.name.clone(),
            output: serde_json::json!({ "error": error.to_string() }),
            is_error: true,
        }
    }
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self::new(role, vec![Part::Text { text: text.into() }])
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Assistant message requesting one or more tool calls
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self::new(Role::Assistant, calls.into_iter().map(Part::ToolCall).collect())
    }

    /// Tool-role message carrying one result
    pub fn tool_result(result: ToolCallResult) -> Self {
        Self::new(Role::Tool, vec![Part::ToolResult(result)])
    }

    /// Concatenated text of all text parts
    pub fn content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool-call requests in the order they were made
    pub fn requested_tools(&self) -> Vec<&ToolCallRequest> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::ToolCall(_)))
    }

    /// JSON form stored in workflow state
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
