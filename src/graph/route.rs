// SPDX-License-Identifier: MIT

//! Route labels and edge targets
//!
//! Routers return a label; a conditional edge maps labels to targets.
//! Closed label enums declare every variant through
//! [`RouteLabel::declared`], so a missing mapping is caught when the graph
//! compiles. Open labels (plain strings) can only be checked at run time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the terminal sentinel
pub const END: &str = "__end__";

/// Where an edge leads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A registered node
    Node(String),
    /// Terminal: the run finishes
    End,
}

impl Target {
    pub fn node(name: impl Into<String>) -> Self {
        Self::Node(name.into())
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        if name == END {
            Self::End
        } else {
            Self::Node(name.to_string())
        }
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::from(name.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(name) => f.write_str(name),
            Self::End => f.write_str(END),
        }
    }
}

/// A value a router may return
pub trait RouteLabel: Send + Sync + 'static {
    /// Key used to look up the route
    fn key(&self) -> String;

    /// Every label the router can produce, when that set is closed
    fn declared() -> Option<Vec<Self>>
    where
        Self: Sized,
    {
        None
    }
}

impl RouteLabel for String {
    fn key(&self) -> String {
        self.clone()
    }
}

impl RouteLabel for &'static str {
    fn key(&self) -> String {
        (*self).to_string()
    }
}
