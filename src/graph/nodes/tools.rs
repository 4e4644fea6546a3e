// SPDX-License-Identifier: MIT

//! Tool-invocation node and the matching router

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::graph::node::{Node, NodeResult};
use crate::graph::registry::ToolBackend;
use crate::graph::route::RouteLabel;
use crate::graph::state::WorkflowState;
use crate::kit::error::{panic_message, BoxError, ToolError};
use crate::kit::message::{Message, ToolCallRequest, ToolCallResult};
use crate::kit::tool::Tool;

/// Executes the tool calls carried by the most recent message
///
/// Calls run one at a time in request order. Every call yields exactly one
/// `tool`-role message; failures (unknown tool, bad arguments, an error or
/// panic inside the tool) become error results instead of node failures.
pub struct ToolNode {
    backend: Arc<dyn ToolBackend>,
}

impl ToolNode {
    pub fn new(backend: Arc<dyn ToolBackend>) -> Self {
        Self { backend }
    }

    async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
        match self.try_invoke(request).await {
            Ok(output) => {
                log::info!("Tool '{}' ({}) succeeded", request.name, request.id);
                ToolCallResult::success(request, output)
            }
            Err(err) => {
                log::warn!("Tool call {} failed: {}", request.id, err);
                ToolCallResult::failure(request, err)
            }
        }
    }

    async fn try_invoke(&self, request: &ToolCallRequest) -> Result<Value, ToolError> {
        let tool = self
            .backend
            .lookup(&request.name)
            .await
            .ok_or_else(|| ToolError::NotFound(request.name.clone()))?;
        let args = validate_args(tool.as_ref(), &request.args)?;

        match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ToolError::Execution {
                tool: request.name.clone(),
                message: e.to_string(),
            }),
            Err(payload) => Err(ToolError::Execution {
                tool: request.name.clone(),
                message: format!("panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        let last = match state.last_message()? {
            Some(message) => message,
            None => return Ok(NodeResult::new()),
        };
        let requests = last.requested_tools();
        if requests.is_empty() {
            log::debug!("No pending tool calls; passing through");
            return Ok(NodeResult::new());
        }

        let mut result = NodeResult::new();
        for request in requests {
            let outcome = self.invoke(request).await;
            result = result.message(Message::tool_result(outcome));
        }
        Ok(result)
    }
}

/// Check call arguments against the tool's JSON schema
///
/// `null` counts as an empty object. Only `required` and primitive `type`
/// declarations on top-level properties are enforced.
pub fn validate_args(tool: &dyn Tool, args: &Value) -> Result<Value, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: tool.name().to_string(),
        reason,
    };

    let object = match args {
        Value::Null => serde_json::Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(invalid(format!(
                "expected a JSON object, got {}",
                type_name(other)
            )))
        }
    };

    let schema = tool.schema();
    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !object.contains_key(key) {
                return Err(invalid(format!("missing required argument '{}'", key)));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, value) in &object {
            let declared = match properties.get(key).and_then(|p| p.get("type")) {
                Some(t) => t,
                None => continue,
            };
            let allowed: Vec<&str> = match declared {
                Value::String(t) => vec![t.as_str()],
                Value::Array(ts) => ts.iter().filter_map(|t| t.as_str()).collect(),
                _ => continue,
            };
            if !allowed.iter().any(|t| matches_type(t, value)) {
                return Err(invalid(format!(
                    "argument '{}' should be {}, got {}",
                    key,
                    allowed.join(" or "),
                    type_name(value)
                )));
            }
        }
    }

    Ok(Value::Object(object))
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Labels produced by [`tools_condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolsRoute {
    Tools,
    End,
}

impl RouteLabel for ToolsRoute {
    fn key(&self) -> String {
        match self {
            ToolsRoute::Tools => "tools".to_string(),
            ToolsRoute::End => "end".to_string(),
        }
    }

    fn declared() -> Option<Vec<Self>> {
        Some(vec![ToolsRoute::Tools, ToolsRoute::End])
    }
}

/// Route to the tool node when the latest message requests tools
pub fn tools_condition(state: &WorkflowState) -> ToolsRoute {
    match state.last_message() {
        Ok(Some(message)) if message.has_tool_calls() => ToolsRoute::Tools,
        _ => ToolsRoute::End,
    }
}
