// SPDX-License-Identifier: MIT

//! Coordinator - sequences pipeline stages by what is already done
//!
//! The coordinator node itself does nothing; its router checks stages in
//! declaration order and picks the first one that is not complete. A stage
//! is complete when its name appears in `completed_stages` or its output
//! field holds an explicit non-null value. Stage output supplied by the
//! caller or restored from a checkpoint therefore skips the stage.
//!
//! ```rust,ignore
//! Coordinator::new("coordinator")
//!     .stage("forecast", "forecast_result", forecast_node)
//!     .stage("pricing", "optimized_prices", pricing_node)
//!     .install(&mut builder)?;
//! builder.set_entry("coordinator")?;
//! ```

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::builder::GraphBuilder;
use crate::graph::definition::ConditionalEdge;
use crate::graph::node::{Node, NodeResult, Passthrough};
use crate::graph::route::Target;
use crate::graph::state::{WorkflowState, COMPLETED_STAGES};
use crate::kit::error::{BoxError, BuildError};

/// Label returned once every stage is complete
pub const DONE: &str = "done";

struct Stage {
    name: String,
    output_field: String,
    node: Arc<dyn Node>,
}

pub struct Coordinator {
    name: String,
    stages: Vec<Stage>,
    on_done: Target,
}

impl Coordinator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            on_done: Target::End,
        }
    }

    /// Add a stage; priority follows call order
    pub fn stage<N>(mut self, name: impl Into<String>, output_field: impl Into<String>, node: N) -> Self
    where
        N: Node + 'static,
    {
        self.stages.push(Stage {
            name: name.into(),
            output_field: output_field.into(),
            node: Arc::new(node),
        });
        self
    }

    /// Where to go once all stages are complete (terminal by default)
    pub fn on_done(mut self, target: impl Into<Target>) -> Self {
        self.on_done = target.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register the coordinator, its stages and their edges
    pub fn install(self, builder: &mut GraphBuilder) -> Result<(), BuildError> {
        builder.register_node(&self.name, Passthrough)?;

        let mut routes = HashMap::new();
        let mut declared = Vec::with_capacity(self.stages.len() + 1);
        let mut order = Vec::with_capacity(self.stages.len());

        for stage in self.stages {
            if stage.name == DONE {
                return Err(BuildError::ReservedName(DONE.to_string()));
            }
            builder.register_node(
                &stage.name,
                StageNode {
                    name: stage.name.clone(),
                    output_field: stage.output_field.clone(),
                    inner: stage.node,
                },
            )?;
            builder.add_edge(&stage.name, self.name.as_str())?;
            routes.insert(stage.name.clone(), Target::node(stage.name.clone()));
            declared.push(stage.name.clone());
            order.push((stage.name, stage.output_field));
        }
        routes.insert(DONE.to_string(), self.on_done);
        declared.push(DONE.to_string());

        let name = self.name.clone();
        let router = move |state: &WorkflowState| {
            let next = order
                .iter()
                .find(|(stage, field)| !stage_complete(state, stage, field))
                .map(|(stage, _)| stage.clone())
                .unwrap_or_else(|| DONE.to_string());
            log::debug!("Coordinator {} selected '{}'", name, next);
            next
        };

        builder.add_router(
            &self.name,
            ConditionalEdge::with_declared(router, routes, declared),
        )?;
        Ok(())
    }
}

/// Whether a stage has run or had its output supplied
pub fn stage_complete(state: &WorkflowState, stage: &str, output_field: &str) -> bool {
    let marked = state
        .get(COMPLETED_STAGES)
        .and_then(|v| v.as_array())
        .map(|done| done.iter().any(|s| s.as_str() == Some(stage)))
        .unwrap_or(false);
    marked || state.is_populated(output_field)
}

/// Wraps a stage body and records its completion
pub struct StageNode {
    name: String,
    output_field: String,
    inner: Arc<dyn Node>,
}

#[async_trait]
impl Node for StageNode {
    async fn run(&self, state: &WorkflowState) -> Result<NodeResult, BoxError> {
        let result = self.inner.run(state).await?;
        let wrote_output = result
            .updates()
            .iter()
            .any(|(k, v)| k == &self.output_field && !v.is_null());

        if wrote_output {
            log::info!("Stage {} completed", self.name);
            Ok(result.set(COMPLETED_STAGES, json!([self.name])))
        } else {
            log::warn!(
                "Stage {} finished without writing '{}'; the coordinator will retry it",
                self.name,
                self.output_field
            );
            Ok(result)
        }
    }
}
