// SPDX-License-Identifier: MIT

//! Switchyard - a small state-graph engine for agent workflows
//!
//! A workflow is a directed graph of named nodes. Each node reads the
//! accumulated [`WorkflowState`](graph::WorkflowState) and returns a partial
//! update; routers pick the next node; the engine persists a per-session
//! checkpoint between runs.
//!
//! - [`kit`] - errors, tools, messages and the model trait
//! - [`graph`] - state, builder, scheduler, checkpoints and built-in nodes
//! - [`config`] - engine configuration
//! - [`tools`] - built-in demonstration tools

pub mod config;
pub mod graph;
pub mod kit;
pub mod tools;
