// SPDX-License-Identifier: MIT

//! Session checkpoints persisted between runs
//!
//! - `CheckpointBackend` - pluggable byte storage (`MemoryBackend`, `FileBackend`)
//! - `CheckpointStore` - encodes `WorkflowState` and serializes access per session

mod backend;
mod store;

pub use backend::{CheckpointBackend, FileBackend, MemoryBackend};
pub use store::{CheckpointStore, SessionCheckpoint, SessionGuard};
