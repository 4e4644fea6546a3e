// SPDX-License-Identifier: MIT

//! Compiled graph definition

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::graph::node::Node;
use crate::graph::route::{RouteLabel, Target};
use crate::graph::state::{StateSchema, WorkflowState};
use crate::kit::error::RoutingError;

pub(crate) type Router = Arc<dyn Fn(&WorkflowState) -> String + Send + Sync>;

/// Router plus its label-to-target table
#[derive(Clone)]
pub struct ConditionalEdge {
    pub(crate) router: Router,
    pub(crate) routes: HashMap<String, Target>,
    /// Labels the router can produce, when known ahead of time
    pub(crate) declared: Option<Vec<String>>,
}

impl ConditionalEdge {
    /// Build from a typed router; closed label sets are recorded for validation
    pub fn new<L, R, I>(router: R, routes: I) -> Self
    where
        L: RouteLabel,
        R: Fn(&WorkflowState) -> L + Send + Sync + 'static,
        I: IntoIterator<Item = (L, Target)>,
    {
        Self {
            router: Arc::new(move |state| router(state).key()),
            routes: routes.into_iter().map(|(l, t)| (l.key(), t)).collect(),
            declared: L::declared().map(|labels| labels.iter().map(RouteLabel::key).collect()),
        }
    }

    /// Build from a string router whose label set is known at construction
    pub(crate) fn with_declared<R>(
        router: R,
        routes: HashMap<String, Target>,
        declared: Vec<String>,
    ) -> Self
    where
        R: Fn(&WorkflowState) -> String + Send + Sync + 'static,
    {
        Self {
            router: Arc::new(router),
            routes,
            declared: Some(declared),
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.routes.values()
    }

    /// Declared labels lacking a route
    pub(crate) fn unmapped_labels(&self) -> Vec<String> {
        self.declared
            .iter()
            .flatten()
            .filter(|label| !self.routes.contains_key(*label))
            .cloned()
            .collect()
    }

    /// Run the router and resolve its label
    pub fn resolve(&self, node: &str, state: &WorkflowState) -> Result<Target, RoutingError> {
        let label = (self.router)(state);
        self.routes
            .get(&label)
            .cloned()
            .ok_or_else(|| RoutingError::UnmappedLabel {
                node: node.to_string(),
                label,
            })
    }
}

/// A validated, executable graph
///
/// Produced by [`GraphBuilder::compile`](crate::graph::GraphBuilder::compile).
/// Immutable and cheap to share across concurrent runs.
pub struct GraphDefinition {
    pub(crate) name: String,
    pub(crate) nodes: HashMap<String, Arc<dyn Node>>,
    pub(crate) static_edges: HashMap<String, Target>,
    pub(crate) conditional_edges: HashMap<String, ConditionalEdge>,
    pub(crate) entry: String,
    pub(crate) error_node: String,
    pub(crate) schema: Arc<StateSchema>,
    pub(crate) reaches_end: bool,
}

impl GraphDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn error_node(&self) -> &str {
        &self.error_node
    }

    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    pub fn node_names(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    /// Whether terminal is statically reachable from the entry
    pub fn reaches_end(&self) -> bool {
        self.reaches_end
    }

    /// Fresh state governed by this graph's schema
    pub fn new_state(&self) -> WorkflowState {
        WorkflowState::new(self.schema.clone())
    }

    /// Next step after `current`: conditional edge, else static edge, else terminal
    pub fn next(&self, current: &str, state: &WorkflowState) -> Result<Target, RoutingError> {
        if current == self.error_node {
            return Ok(Target::End);
        }
        if let Some(edge) = self.conditional_edges.get(current) {
            return edge.resolve(current, state);
        }
        Ok(self
            .static_edges
            .get(current)
            .cloned()
            .unwrap_or(Target::End))
    }

    /// Possible successors of a node, ignoring router data
    pub(crate) fn successors<'a>(
        static_edges: &'a HashMap<String, Target>,
        conditional_edges: &'a HashMap<String, ConditionalEdge>,
        node: &str,
    ) -> Vec<&'a Target> {
        let mut out: Vec<&Target> = Vec::new();
        if let Some(edge) = conditional_edges.get(node) {
            out.extend(edge.targets());
        } else if let Some(target) = static_edges.get(node) {
            out.push(target);
        }
        out
    }

    /// Breadth-first search for a path from `entry` to terminal
    pub(crate) fn terminal_reachable(
        entry: &str,
        static_edges: &HashMap<String, Target>,
        conditional_edges: &HashMap<String, ConditionalEdge>,
    ) -> bool {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::from([entry.to_string()]);

        while let Some(node) = queue.pop_front() {
            if !seen.insert(node.clone()) {
                continue;
            }
            let successors = Self::successors(static_edges, conditional_edges, &node);
            if successors.is_empty() {
                return true;
            }
            for target in successors {
                match target {
                    Target::End => return true,
                    Target::Node(next) => queue.push_back(next.clone()),
                }
            }
        }
        false
    }
}

impl std::fmt::Debug for GraphDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut nodes: Vec<&String> = self.nodes.keys().collect();
        nodes.sort();
        f.debug_struct("GraphDefinition")
            .field("name", &self.name)
            .field("nodes", &nodes)
            .field("entry", &self.entry)
            .field("error_node", &self.error_node)
            .field("reaches_end", &self.reaches_end)
            .finish()
    }
}
