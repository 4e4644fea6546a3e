// SPDX-License-Identifier: MIT

//! State management for graph workflows
//!
//! This module provides:
//! - `StateSchema` - declared fields with merge strategies and defaults
//! - `WorkflowState` - runtime state with per-field merging
//! - `ErrorMarker` - the value held by the reserved `error` field

mod schema;
mod store;

pub use schema::{MergeStrategy, StateFieldDef, StateSchema};
pub use store::{ErrorMarker, WorkflowState};

/// Conversation history, `Append`, default `[]`
pub const MESSAGES: &str = "messages";
/// Error marker, `Replace`
pub const ERROR: &str = "error";
/// Coordinator stage-completion markers, `Append`, default `[]`
pub const COMPLETED_STAGES: &str = "completed_stages";
