// SPDX-License-Identifier: MIT

//! Graph engine
//!
//! Declare nodes and edges with [`GraphBuilder`], compile to a
//! [`GraphDefinition`], and run it for a session with [`Engine`].

pub mod builder;
pub mod checkpoint;
pub mod definition;
pub mod node;
pub mod nodes;
pub mod registry;
pub mod route;
pub mod scheduler;
pub mod state;

pub use builder::{GraphBuilder, DEFAULT_ERROR_NODE};
pub use checkpoint::{
    CheckpointBackend, CheckpointStore, FileBackend, MemoryBackend, SessionCheckpoint,
};
pub use definition::{ConditionalEdge, GraphDefinition};
pub use node::{from_fn, node_fn, Node, NodeResult, Passthrough};
pub use nodes::{tools_condition, Coordinator, ErrorNode, ModelNode, ToolNode, ToolsRoute};
pub use registry::{ToolBackend, ToolRegistry};
pub use route::{RouteLabel, Target, END};
pub use scheduler::{Engine, RunOutcome, RunReport, DEFAULT_MAX_ITERATIONS};
pub use state::{
    ErrorMarker, MergeStrategy, StateFieldDef, StateSchema, WorkflowState, COMPLETED_STAGES,
    ERROR, MESSAGES,
};
