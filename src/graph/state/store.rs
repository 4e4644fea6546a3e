// SPDX-License-Identifier: MIT

//! Runtime state storage for workflow execution

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::schema::{MergeStrategy, StateSchema};
use super::{ERROR, MESSAGES};
use crate::graph::node::NodeResult;
use crate::kit::error::ErrorCategory;
use crate::kit::message::Message;

/// Runtime workflow state with per-field merge strategies
///
/// Only explicitly written values are stored. Declared defaults are reported
/// by [`get`](Self::get) but never materialized, so a checkpoint or a
/// restored run never mistakes a default for real output.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    fields: BTreeMap<String, Value>,
    schema: Arc<StateSchema>,
}

/// Value of the reserved `error` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub category: ErrorCategory,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub detail: String,
}

impl ErrorMarker {
    pub fn new(category: ErrorCategory, node: Option<&str>, detail: impl Into<String>) -> Self {
        Self {
            category,
            node: node.map(str::to_string),
            detail: detail.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl WorkflowState {
    /// Create an empty state governed by a schema
    pub fn new(schema: Arc<StateSchema>) -> Self {
        Self {
            fields: BTreeMap::new(),
            schema,
        }
    }

    /// Create an empty state declaring only the reserved fields
    pub fn empty() -> Self {
        Self::new(Arc::new(StateSchema::reserved()))
    }

    /// Builder-style update, handy for constructing run input
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.update(key, value);
        self
    }

    /// Builder-style message append
    pub fn with_message(self, message: Message) -> Self {
        self.with(MESSAGES, Value::Array(vec![message.to_value()]))
    }

    /// Update a field using its declared merge strategy
    pub fn update(&mut self, key: &str, value: Value) {
        match self.schema.merge_strategy(key) {
            MergeStrategy::Replace => {
                self.fields.insert(key.to_string(), value);
            }
            MergeStrategy::Append => {
                let current = match self.fields.remove(key) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) => Vec::new(),
                    Some(other) => vec![other],
                    None => match self.schema.default_value(key) {
                        Some(Value::Array(items)) => items.clone(),
                        _ => Vec::new(),
                    },
                };
                let mut items = current;
                match value {
                    Value::Array(new_items) => items.extend(new_items),
                    other => items.push(other),
                }
                self.fields.insert(key.to_string(), Value::Array(items));
            }
        }
    }

    /// Merge a node result, update by update, in order
    pub fn apply(&mut self, result: NodeResult) {
        for (key, value) in result.into_updates() {
            self.update(&key, value);
        }
    }

    /// Field value, falling back to the declared default
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .get(key)
            .or_else(|| self.schema.default_value(key))
    }

    /// True when the field was explicitly written with a non-null value
    pub fn is_populated(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(v) if !v.is_null())
    }

    /// Conversation history
    pub fn messages(&self) -> Result<Vec<Message>, serde_json::Error> {
        match self.get(MESSAGES) {
            Some(value) => serde_json::from_value(value.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// Most recent conversation entry
    pub fn last_message(&self) -> Result<Option<Message>, serde_json::Error> {
        match self.get(MESSAGES).and_then(|v| v.as_array()).and_then(|a| a.last()) {
            Some(value) => serde_json::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// Number of conversation entries
    pub fn message_count(&self) -> usize {
        self.get(MESSAGES)
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0)
    }

    /// Current error marker, if one is set and well-formed
    pub fn error_marker(&self) -> Option<ErrorMarker> {
        match self.fields.get(ERROR) {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(marker) => Some(marker),
                Err(_) => Some(ErrorMarker::new(
                    ErrorCategory::Unclassified,
                    None,
                    value.to_string(),
                )),
            },
        }
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Explicitly written fields
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }

    /// Replace raw field values without merging (checkpoint restore)
    pub(crate) fn restore(&mut self, fields: BTreeMap<String, Value>) {
        self.fields = fields;
    }

    /// Convert state (defaults included) to a JSON object
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, def) in &self.schema.fields {
            if let Some(default) = &def.default {
                map.insert(name.clone(), default.clone());
            }
        }
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }

    /// Names of explicitly written fields
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::empty()
    }
}
