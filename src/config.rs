// SPDX-License-Identifier: MIT

//! Engine configuration
//!
//! Loaded from YAML, then overlaid by environment variables:
//!
//! ```yaml
//! max_iterations: 10
//! node_timeout_secs: 60
//! checkpoint:
//!   backend: file
//!   dir: ./.switchyard/sessions
//! ```
//!
//! - `SWITCHYARD_MAX_ITERATIONS`
//! - `SWITCHYARD_NODE_TIMEOUT_SECS`
//! - `SWITCHYARD_CHECKPOINT_DIR` (switches to the file backend)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::graph::checkpoint::{CheckpointStore, FileBackend, MemoryBackend};
use crate::graph::scheduler::DEFAULT_MAX_ITERATIONS;
use crate::kit::error::SwitchyardError;

pub const ENV_MAX_ITERATIONS: &str = "SWITCHYARD_MAX_ITERATIONS";
pub const ENV_NODE_TIMEOUT_SECS: &str = "SWITCHYARD_NODE_TIMEOUT_SECS";
pub const ENV_CHECKPOINT_DIR: &str = "SWITCHYARD_CHECKPOINT_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_iterations: usize,
    /// Per-node time limit; unset means nodes may run indefinitely
    pub node_timeout_secs: Option<u64>,
    pub checkpoint: CheckpointConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CheckpointConfig {
    #[default]
    Memory,
    File {
        dir: PathBuf,
    },
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            node_timeout_secs: None,
            checkpoint: CheckpointConfig::Memory,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(content: &str) -> Result<Self, SwitchyardError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SwitchyardError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SwitchyardError::config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// File (when given) plus process environment
    pub fn resolve(path: Option<&Path>) -> Result<Self, SwitchyardError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let vars: HashMap<String, String> = env::vars().collect();
        let config = config.with_env(&vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment map
    pub fn with_env(mut self, vars: &HashMap<String, String>) -> Result<Self, SwitchyardError> {
        if let Some(raw) = vars.get(ENV_MAX_ITERATIONS) {
            self.max_iterations = parse_var(ENV_MAX_ITERATIONS, raw)?;
        }
        if let Some(raw) = vars.get(ENV_NODE_TIMEOUT_SECS) {
            self.node_timeout_secs = Some(parse_var(ENV_NODE_TIMEOUT_SECS, raw)?);
        }
        if let Some(dir) = vars.get(ENV_CHECKPOINT_DIR).filter(|d| !d.is_empty()) {
            self.checkpoint = CheckpointConfig::File {
                dir: PathBuf::from(dir),
            };
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SwitchyardError> {
        if self.max_iterations == 0 {
            return Err(SwitchyardError::config("max_iterations must be at least 1"));
        }
        if self.node_timeout_secs == Some(0) {
            return Err(SwitchyardError::config(
                "node_timeout_secs must be positive when set",
            ));
        }
        Ok(())
    }

    pub fn build_store(&self) -> CheckpointStore {
        match &self.checkpoint {
            CheckpointConfig::Memory => CheckpointStore::new(Arc::new(MemoryBackend::new())),
            CheckpointConfig::File { dir } => {
                log::info!("Using file checkpoints in {}", dir.display());
                CheckpointStore::new(Arc::new(FileBackend::new(dir.clone())))
            }
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, SwitchyardError> {
    raw.trim()
        .parse()
        .map_err(|_| SwitchyardError::config(format!("{} has invalid value '{}'", name, raw)))
}
