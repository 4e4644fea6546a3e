// SPDX-License-Identifier: MIT

//! Execution scheduler
//!
//! Runs a compiled graph one node at a time:
//!
//! 1. Take the session lock, restore the checkpoint and merge the input
//!    over it (replace fields: input wins; append fields: prior ++ input).
//! 2. Loop from the entry node. Each iteration checks cancellation, enforces
//!    the iteration ceiling, runs one node against the current state and
//!    merges its result.
//! 3. Route: to the error node when an error marker is set, otherwise along
//!    the conditional edge, the static edge or to terminal.
//! 4. At terminal, persist the state and return it.
//!
//! Node failures of any kind (errors, panics, timeouts) become error markers;
//! only routing failures and cancellation abort a run.

use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::graph::checkpoint::CheckpointStore;
use crate::graph::definition::GraphDefinition;
use crate::graph::node::{Node, NodeResult};
use crate::graph::route::Target;
use crate::graph::state::{ErrorMarker, WorkflowState, ERROR};
use crate::kit::error::{panic_message, ErrorCategory, RunError, SwitchyardError};

/// Default iteration ceiling
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// How a run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Reached terminal without visiting the error node
    Completed,
    /// A failure was converted into an apology by the error node
    Recovered(ErrorCategory),
}

/// Everything known about a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: WorkflowState,
    /// Node executions, the error node included
    pub iterations: usize,
    /// Node names in execution order
    pub visited: Vec<String>,
    pub outcome: RunOutcome,
    /// Whether the final state was written to the checkpoint store
    pub checkpointed: bool,
}

/// The engine: checkpoint store plus execution limits
///
/// Graphs are passed per call, so one engine serves any number of graphs
/// and concurrent sessions.
#[derive(Clone)]
pub struct Engine {
    checkpoints: CheckpointStore,
    max_iterations: usize,
    node_timeout: Option<Duration>,
}

impl Engine {
    pub fn new(checkpoints: CheckpointStore) -> Self {
        Self {
            checkpoints,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            node_timeout: None,
        }
    }

    /// Engine with a process-local checkpoint store
    pub fn in_memory() -> Self {
        Self::new(CheckpointStore::in_memory())
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, SwitchyardError> {
        config.validate()?;
        let mut engine =
            Self::new(config.build_store()).with_max_iterations(config.max_iterations);
        if let Some(secs) = config.node_timeout_secs {
            engine = engine.with_node_timeout(Duration::from_secs(secs));
        }
        Ok(engine)
    }

    /// Iteration ceiling; values below 1 are raised to 1
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Fail a node that runs longer than `timeout`
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = Some(timeout);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Run a graph for a session and return the final state
    pub async fn run(
        &self,
        graph: &GraphDefinition,
        input: WorkflowState,
        session_id: &str,
    ) -> Result<WorkflowState, RunError> {
        self.execute(graph, input, session_id, &CancellationToken::new())
            .await
            .map(|report| report.state)
    }

    /// Run a graph, honoring `cancel` between iterations
    pub async fn execute(
        &self,
        graph: &GraphDefinition,
        input: WorkflowState,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RunReport, RunError> {
        let session = self.checkpoints.session(session_id).await;
        let error_node = graph.error_node().to_string();

        let mut state = graph.new_state();
        let mut load_failure = None;
        match session.load().await {
            Ok(Some(checkpoint)) => {
                log::debug!(
                    "Restored session '{}' from {}",
                    session_id,
                    checkpoint.last_updated
                );
                state.restore(checkpoint.state);
            }
            Ok(None) => log::debug!("No checkpoint for session '{}'", session_id),
            Err(e) => {
                log::error!("Failed to load checkpoint for session '{}': {}", session_id, e);
                load_failure = Some(e.to_string());
            }
        }
        for (key, value) in input.into_fields() {
            state.update(&key, value);
        }

        let mut current = graph.entry().to_string();
        if let Some(detail) = &load_failure {
            let marker = ErrorMarker::new(ErrorCategory::PersistenceUnavailable, None, detail.as_str());
            state.update(ERROR, marker.to_value());
        }
        if state.error_marker().is_some() {
            current = error_node.clone();
        }

        log::info!(
            "Starting graph '{}' for session '{}' at '{}'",
            graph.name(),
            session_id,
            current
        );

        let mut iterations = 0;
        let mut visited = Vec::new();
        let mut recovered = None;

        loop {
            if cancel.is_cancelled() {
                log::warn!(
                    "Run for session '{}' cancelled before '{}'",
                    session_id,
                    current
                );
                return Err(RunError::Cancelled {
                    session_id: session_id.to_string(),
                });
            }

            iterations += 1;
            if iterations > self.max_iterations && current != error_node {
                log::warn!(
                    "Session '{}' exceeded {} iterations at '{}'",
                    session_id,
                    self.max_iterations,
                    current
                );
                let marker = ErrorMarker::new(
                    ErrorCategory::BoundedIteration,
                    Some(current.as_str()),
                    format!("iteration limit of {} reached", self.max_iterations),
                );
                state.update(ERROR, marker.to_value());
                current = error_node.clone();
            }

            let node = graph
                .node(&current)
                .ok_or_else(|| RunError::UnknownNode(current.clone()))?;
            if current == error_node {
                if let Some(marker) = state.error_marker() {
                    recovered = Some(marker.category);
                }
            }

            log::info!(
                "Session '{}' iteration {}/{}: running '{}'",
                session_id,
                iterations,
                self.max_iterations,
                current
            );
            visited.push(current.clone());

            match self.invoke(node, &state).await {
                Ok(result) => state.apply(result),
                Err((category, detail)) => {
                    log::error!("Node '{}' failed ({}): {}", current, category, detail);
                    let marker = ErrorMarker::new(category, Some(current.as_str()), detail);
                    state.update(ERROR, marker.to_value());
                }
            }
            if current == error_node {
                // A handled marker must never reach the checkpoint
                state.update(ERROR, Value::Null);
            }

            let next = if current != error_node && state.error_marker().is_some() {
                Target::node(error_node.clone())
            } else {
                graph.next(&current, &state).map_err(|e| {
                    log::error!("Aborting run for session '{}': {}", session_id, e);
                    e
                })?
            };
            log::debug!("Routing '{}' -> '{}'", current, next);

            match next {
                Target::End => break,
                Target::Node(name) => current = name,
            }
        }

        let checkpointed = if load_failure.is_some() {
            log::warn!(
                "Skipping checkpoint for session '{}' after a failed load",
                session_id
            );
            false
        } else {
            match session.save(&state).await {
                Ok(_) => true,
                Err(e) => {
                    log::error!("Failed to checkpoint session '{}': {}", session_id, e);
                    false
                }
            }
        };

        let outcome = match recovered {
            Some(category) => RunOutcome::Recovered(category),
            None => RunOutcome::Completed,
        };
        log::info!(
            "Finished graph '{}' for session '{}' after {} iterations ({:?})",
            graph.name(),
            session_id,
            iterations,
            outcome
        );

        Ok(RunReport {
            state,
            iterations,
            visited,
            outcome,
            checkpointed,
        })
    }

    /// Run one node, converting every failure mode into a category and detail
    async fn invoke(
        &self,
        node: &Arc<dyn Node>,
        state: &WorkflowState,
    ) -> Result<NodeResult, (ErrorCategory, String)> {
        let guarded = AssertUnwindSafe(node.run(state)).catch_unwind();
        let outcome = match self.node_timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err((
                        ErrorCategory::Unclassified,
                        format!("timed out after {:?}", limit),
                    ))
                }
            },
            None => guarded.await,
        };

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err((ErrorCategory::classify(e.as_ref()), e.to_string())),
            Err(payload) => Err((
                ErrorCategory::Unclassified,
                format!("panicked: {}", panic_message(payload.as_ref())),
            )),
        }
    }
}
