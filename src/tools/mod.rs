// SPDX-License-Identifier: MIT

//! Built-in tools available to the `chat` command

pub mod math;

use std::sync::Arc;

use crate::kit::tool::Tool;

pub use math::{AddTool, CurrentTimeTool, MultiplyTool};

pub fn create_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(AddTool),
        Arc::new(MultiplyTool),
        Arc::new(CurrentTimeTool),
    ]
}
