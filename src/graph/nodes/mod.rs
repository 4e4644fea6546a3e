// SPDX-License-Identifier: MIT

//! Built-in nodes
//!
//! - `ToolNode` - runs pending tool calls; pair with `tools_condition`
//! - `ErrorNode` - converts error markers into an apology message
//! - `ModelNode` - one model turn over the conversation
//! - `Coordinator` - sequences stages by completion

mod coordinator;
mod error;
mod model;
mod tools;

pub use coordinator::{stage_complete, Coordinator, StageNode, DONE};
pub use error::ErrorNode;
pub use model::ModelNode;
pub use tools::{tools_condition, validate_args, ToolNode, ToolsRoute};
