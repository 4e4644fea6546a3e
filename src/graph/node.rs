// SPDX-License-Identifier: MIT

//! Nodes - named units of work in a graph

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::graph::state::{WorkflowState, MESSAGES};
use crate::kit::error::BoxError;
use crate::kit::message::Message;

/// Partial state returned by a node: only the fields it updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeResult {
    updates: Vec<(String, Value)>,
}

impl NodeResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a field; merged with the field's declared strategy
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.updates.push((key.into(), value));
        self
    }

    /// Append one conversation entry
    pub fn message(self, message: Message) -> Self {
        self.set(MESSAGES, Value::Array(vec![message.to_value()]))
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// True when the result writes this field
    pub fn writes(&self, key: &str) -> bool {
        self.updates.iter().any(|(k, _)| k == key)
    }

    pub fn updates(&self) -> &[(String, Value)] {
        &self.updates
    }

    pub fn into_updates(self) -> Vec<(String, Value)> {
        self.updates
    }
}

/// A named step in the graph
///
/// Nodes read a snapshot of the state and return only the fields they
/// change. They should not keep hidden mutable state between calls; any
/// error they return is absorbed by the engine and routed to the error node.
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError>;
}

#[async_trait]
impl<N: Node + ?Sized> Node for Arc<N> {
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        (**self).run(state).await
    }
}

/// Node backed by an async closure receiving an owned snapshot
pub struct FnNode<F> {
    f: F,
}

/// Wrap an async closure as a node
pub fn node_fn<F, Fut>(f: F) -> FnNode<F>
where
    F: Fn(WorkflowState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<NodeResult, BoxError>> + Send,
{
    FnNode { f }
}

#[async_trait]
impl<F, Fut> Node for FnNode<F>
where
    F: Fn(WorkflowState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<NodeResult, BoxError>> + Send,
{
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        (self.f)(state.clone()).await
    }
}

/// Node backed by a synchronous closure
pub struct SyncFnNode<F> {
    f: F,
}

/// Wrap a synchronous closure as a node
pub fn from_fn<F>(f: F) -> SyncFnNode<F>
where
    F: Fn(&WorkflowState) -> Result<NodeResult, BoxError> + Send + Sync,
{
    SyncFnNode { f }
}

#[async_trait]
impl<F> Node for SyncFnNode<F>
where
    F: Fn(&WorkflowState) -> Result<NodeResult, BoxError> + Send + Sync,
{
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        (self.f)(state)
    }
}

/// Node that changes nothing
pub struct Passthrough;

#[async_trait]
impl Node for Passthrough {
    async fn run(&self, _state: &WorkflowState) -> Result<NodeResult, BoxError> {
        Ok(NodeResult::new())
    }
}
