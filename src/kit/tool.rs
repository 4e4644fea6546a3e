// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::kit::error::BoxError;

/// Trait for tools that can be requested by a node and run by the tool node.
///
/// `name()` and `description()` return `&str` and `schema()` returns `&Value`
/// so implementations keep them in struct fields or statics instead of
/// rebuilding them per call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (unique within a registry)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value) -> Result<Value, BoxError>;
}

/// Tool backed by a plain closure
pub struct FnTool<F> {
    name: String,
    description: String,
    schema: Value,
    f: F,
}

impl<F> FnTool<F>
where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        f: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            f,
        }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, input: Value) -> Result<Value, BoxError> {
        (self.f)(input)
    }
}
