// SPDX-License-Identifier: MIT

//! Typed error handling for switchyard
//!
//! Only [`BuildError`] and [`RunError`] ever reach the caller of the engine.
//! Everything a node or tool raises at run time is absorbed into workflow
//! state and classified by [`ErrorCategory`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type returned by node and tool bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for switchyard
#[derive(Debug, Error)]
pub enum SwitchyardError {
    /// Graph construction failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A run aborted
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    /// Checkpoint backend errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Tool lookup or execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Model/LLM errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Configuration errors (invalid file, bad env var)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Errors raised while declaring or compiling a graph
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A node with this name is already registered
    #[error("Node '{0}' is already registered")]
    DuplicateNode(String),

    /// An edge or setting references a node that was never registered
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// `compile` was called without an entry node
    #[error("Graph has no entry node")]
    MissingEntry,

    /// The name is reserved by the engine
    #[error("Name '{0}' is reserved")]
    ReservedName(String),

    /// A node already has an edge of this kind
    #[error("Node '{0}' already has an outgoing {1} edge")]
    DuplicateEdge(String, &'static str),

    /// A declared route label has no target
    #[error("Conditional edge from '{node}' has no route for label '{label}'")]
    UnmappedRoute { node: String, label: String },

    /// The error node must always terminate
    #[error("Error node '{0}' cannot have outgoing edges")]
    ErrorNodeHasEdges(String),

    /// A reserved state field was redeclared with a different merge strategy
    #[error("State field '{0}' is reserved and cannot change its merge strategy")]
    ReservedField(String),
}

/// A router produced a label with no declared target
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Router on node '{node}' returned unmapped label '{label}'")]
    UnmappedLabel { node: String, label: String },
}

/// Structural failures that abort a run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Routing could not resolve the next node
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A route resolved to a node the graph does not contain
    #[error("Node '{0}' is not registered in this graph")]
    UnknownNode(String),

    /// The run was cancelled between iterations
    #[error("Run for session '{session_id}' was cancelled")]
    Cancelled { session_id: String },
}

/// Tool lookup, validation and execution failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Tool not found in the backend
    #[error("Tool '{0}' not found")]
    NotFound(String),

    /// Arguments do not satisfy the tool schema
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool itself failed
    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

/// Checkpoint storage failures
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The storage backend could not be reached or refused the operation
    #[error("Checkpoint backend unavailable: {0}")]
    Unavailable(String),

    /// Stored bytes could not be decoded
    #[error("Corrupt checkpoint for session '{session_id}': {source}")]
    Corrupt {
        session_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider returned a non-success status
    #[error("API error from {provider} ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

/// Categories of recoverable failures, each mapped to a fixed user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    BoundedIteration,
    PersistenceUnavailable,
    ToolFailure,
    Unclassified,
}

impl ErrorCategory {
    /// Classify a node failure by its concrete error type
    pub fn classify(err: &(dyn std::error::Error + 'static)) -> Self {
        if err.downcast_ref::<ToolError>().is_some() {
            return Self::ToolFailure;
        }
        if err.downcast_ref::<CheckpointError>().is_some() {
            return Self::PersistenceUnavailable;
        }
        match err.downcast_ref::<SwitchyardError>() {
            Some(SwitchyardError::Tool(_)) => Self::ToolFailure,
            Some(SwitchyardError::Checkpoint(_)) => Self::PersistenceUnavailable,
            _ => Self::Unclassified,
        }
    }

    /// Fixed human-readable message for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BoundedIteration => {
                "I couldn't finish this request within the allowed number of steps. \
                 Please try again or break it into smaller requests."
            }
            Self::PersistenceUnavailable => {
                "I couldn't access this conversation's saved history right now. \
                 Please try again shortly."
            }
            Self::ToolFailure => {
                "A tool needed for this request failed. Please try again later."
            }
            Self::Unclassified => {
                "Something went wrong while processing your request. Please try again."
            }
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BoundedIteration => "boundedIteration",
            Self::PersistenceUnavailable => "persistenceUnavailable",
            Self::ToolFailure => "toolFailure",
            Self::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl SwitchyardError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for SwitchyardError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for SwitchyardError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
