// SPDX-License-Identifier: MIT

//! Engine-independent building blocks
//!
//! - [error] - typed error hierarchy
//! - [message] - conversation entries, tool-call requests and results
//! - [model] - the `Model` trait and provider adapters
//! - [tool] - the `Tool` trait

pub mod error;
pub mod message;
pub mod model;
pub mod tool;
