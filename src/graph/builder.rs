// SPDX-License-Identifier: MIT

//! Graph builder - declares nodes, edges and state, then compiles
//!
//! ```rust,ignore
//! let mut builder = GraphBuilder::new("assistant");
//! builder
//!     .register_node("agent", agent)?
//!     .register_node("tools", ToolNode::new(registry))?
//!     .add_conditional_edge("agent", tools_condition, [
//!         (ToolsRoute::Tools, Target::node("tools")),
//!         (ToolsRoute::End, Target::End),
//!     ])?
//!     .add_edge("tools", "agent")?
//!     .set_entry("agent")?;
//! let graph = builder.compile()?;
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::definition::{ConditionalEdge, GraphDefinition};
use crate::graph::node::Node;
use crate::graph::nodes::ErrorNode;
use crate::graph::route::{RouteLabel, Target, END};
use crate::graph::state::{MergeStrategy, StateFieldDef, StateSchema, WorkflowState};
use crate::kit::error::BuildError;

/// Name given to the built-in error node when none is registered
pub const DEFAULT_ERROR_NODE: &str = "error";

/// Mutable graph under construction
pub struct GraphBuilder {
    name: String,
    schema: StateSchema,
    nodes: HashMap<String, Arc<dyn Node>>,
    static_edges: HashMap<String, Target>,
    conditional_edges: HashMap<String, ConditionalEdge>,
    entry: Option<String>,
    error_node: Option<String>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: StateSchema::reserved(),
            nodes: HashMap::new(),
            static_edges: HashMap::new(),
            conditional_edges: HashMap::new(),
            entry: None,
            error_node: None,
        }
    }

    /// Declare a state field with its merge strategy and optional default
    pub fn field(
        &mut self,
        name: &str,
        merge: MergeStrategy,
        default: Option<Value>,
    ) -> Result<&mut Self, BuildError> {
        self.schema.declare(name, StateFieldDef::new(merge, default))?;
        Ok(self)
    }

    /// Declare every field of a schema (e.g. one loaded from YAML)
    pub fn with_schema(&mut self, schema: StateSchema) -> Result<&mut Self, BuildError> {
        for (name, def) in schema.fields {
            self.schema.declare(&name, def)?;
        }
        Ok(self)
    }

    pub fn register_node<N>(&mut self, name: &str, node: N) -> Result<&mut Self, BuildError>
    where
        N: Node + 'static,
    {
        if name == END {
            return Err(BuildError::ReservedName(name.to_string()));
        }
        if self.nodes.contains_key(name) {
            return Err(BuildError::DuplicateNode(name.to_string()));
        }
        self.nodes.insert(name.to_string(), Arc::new(node));
        Ok(self)
    }

    /// Static edge; `to` may be a node name or [`END`]
    pub fn add_edge(&mut self, from: &str, to: impl Into<Target>) -> Result<&mut Self, BuildError> {
        let to = to.into();
        self.require_node(from)?;
        self.require_target(&to)?;
        if self.static_edges.contains_key(from) {
            return Err(BuildError::DuplicateEdge(from.to_string(), "static"));
        }
        self.static_edges.insert(from.to_string(), to);
        Ok(self)
    }

    /// Conditional edge routed by `router` over the `routes` table
    pub fn add_conditional_edge<L, R, I>(
        &mut self,
        from: &str,
        router: R,
        routes: I,
    ) -> Result<&mut Self, BuildError>
    where
        L: RouteLabel,
        R: Fn(&WorkflowState) -> L + Send + Sync + 'static,
        I: IntoIterator<Item = (L, Target)>,
    {
        self.add_router(from, ConditionalEdge::new(router, routes))
    }

    pub(crate) fn add_router(
        &mut self,
        from: &str,
        edge: ConditionalEdge,
    ) -> Result<&mut Self, BuildError> {
        self.require_node(from)?;
        for target in edge.targets() {
            self.require_target(target)?;
        }
        if self.conditional_edges.contains_key(from) {
            return Err(BuildError::DuplicateEdge(from.to_string(), "conditional"));
        }
        self.conditional_edges.insert(from.to_string(), edge);
        Ok(self)
    }

    pub fn set_entry(&mut self, name: &str) -> Result<&mut Self, BuildError> {
        self.require_node(name)?;
        self.entry = Some(name.to_string());
        Ok(self)
    }

    /// Use a registered node as the error node instead of the built-in one
    pub fn set_error_node(&mut self, name: &str) -> Result<&mut Self, BuildError> {
        self.require_node(name)?;
        self.error_node = Some(name.to_string());
        Ok(self)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    fn require_node(&self, name: &str) -> Result<(), BuildError> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(BuildError::UnknownNode(name.to_string()))
        }
    }

    fn require_target(&self, target: &Target) -> Result<(), BuildError> {
        match target {
            Target::End => Ok(()),
            Target::Node(name) => self.require_node(name),
        }
    }

    /// Validate and freeze the graph
    pub fn compile(mut self) -> Result<GraphDefinition, BuildError> {
        let entry = self.entry.clone().ok_or(BuildError::MissingEntry)?;

        let error_node = match self.error_node.clone() {
            Some(name) => name,
            None => {
                if !self.nodes.contains_key(DEFAULT_ERROR_NODE) {
                    self.register_node(DEFAULT_ERROR_NODE, ErrorNode::default())?;
                }
                DEFAULT_ERROR_NODE.to_string()
            }
        };
        if self.static_edges.contains_key(&error_node)
            || self.conditional_edges.contains_key(&error_node)
        {
            return Err(BuildError::ErrorNodeHasEdges(error_node));
        }

        for target in self.static_edges.values() {
            self.require_target(target)?;
        }
        for (from, edge) in &self.conditional_edges {
            for target in edge.targets() {
                self.require_target(target)?;
            }
            if let Some(label) = edge.unmapped_labels().into_iter().next() {
                return Err(BuildError::UnmappedRoute {
                    node: from.clone(),
                    label,
                });
            }
            if self.static_edges.contains_key(from) {
                log::warn!(
                    "Node '{}' has both a static and a conditional edge; the conditional edge wins",
                    from
                );
            }
        }

        let reaches_end = GraphDefinition::terminal_reachable(
            &entry,
            &self.static_edges,
            &self.conditional_edges,
        );
        if !reaches_end {
            log::warn!(
                "Graph '{}': no path from '{}' statically reaches the end; runs will stop at the iteration limit",
                self.name,
                entry
            );
        }

        log::info!(
            "Compiled graph '{}' with {} nodes (entry: {}, error node: {})",
            self.name,
            self.nodes.len(),
            entry,
            error_node
        );

        Ok(GraphDefinition {
            name: self.name,
            nodes: self.nodes,
            static_edges: self.static_edges,
            conditional_edges: self.conditional_edges,
            entry,
            error_node,
            schema: Arc::new(self.schema),
            reaches_end,
        })
    }
}
