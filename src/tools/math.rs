// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::kit::error::{BoxError, ToolError};
use crate::kit::tool::Tool;

// --- Static schemas ---

static BINARY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "a": {
                "type": "number",
                "description": "Left operand"
            },
            "b": {
                "type": "number",
                "description": "Right operand"
            }
        },
        "required": ["a", "b"]
    })
});

static CURRENT_TIME_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {}
    })
});

#[derive(Debug, Deserialize)]
struct BinaryArgs {
    a: f64,
    b: f64,
}

/// Integers stay integers in the output when both operands are whole
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn finite(tool: &str, value: f64) -> Result<Value, BoxError> {
    if value.is_finite() {
        Ok(number(value))
    } else {
        Err(ToolError::Execution {
            tool: tool.to_string(),
            message: "result is not a finite number".to_string(),
        }
        .into())
    }
}

pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Adds two numbers and returns the sum."
    }

    fn schema(&self) -> &Value {
        &BINARY_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, BoxError> {
        let args: BinaryArgs = serde_json::from_value(input)?;
        finite(self.name(), args.a + args.b)
    }
}

pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiplies two numbers and returns the product."
    }

    fn schema(&self) -> &Value {
        &BINARY_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value, BoxError> {
        let args: BinaryArgs = serde_json::from_value(input)?;
        finite(self.name(), args.a * args.b)
    }
}

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Returns the current UTC time in RFC 3339 format."
    }

    fn schema(&self) -> &Value {
        &CURRENT_TIME_SCHEMA
    }

    async fn execute(&self, _input: Value) -> Result<Value, BoxError> {
        Ok(json!({ "utc": Utc::now().to_rfc3339() }))
    }
}
