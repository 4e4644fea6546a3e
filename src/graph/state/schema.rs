// SPDX-License-Identifier: MIT

//! State schema definitions

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{COMPLETED_STAGES, ERROR, MESSAGES};
use crate::kit::error::BuildError;

/// Schema defining the workflow state structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct StateSchema {
    /// Field definitions
    #[serde(flatten)]
    pub fields: BTreeMap<String, StateFieldDef>,
}

/// Definition of a single state field
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct StateFieldDef {
    /// How new values combine with the current one
    #[serde(default)]
    pub merge: MergeStrategy,
    /// Value reported while the field is unset
    pub default: Option<Value>,
}

/// Merge strategies for folding node results into state
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// New value overwrites (last writer wins)
    #[default]
    #[serde(alias = "overwrite")]
    Replace,
    /// New value(s) concatenated onto the existing sequence
    Append,
}

impl StateFieldDef {
    pub fn new(merge: MergeStrategy, default: Option<Value>) -> Self {
        Self { merge, default }
    }
}

impl StateSchema {
    /// Schema holding only the engine's reserved fields
    pub fn reserved() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            MESSAGES.to_string(),
            StateFieldDef::new(MergeStrategy::Append, Some(json!([]))),
        );
        fields.insert(
            ERROR.to_string(),
            StateFieldDef::new(MergeStrategy::Replace, None),
        );
        fields.insert(
            COMPLETED_STAGES.to_string(),
            StateFieldDef::new(MergeStrategy::Append, Some(json!([]))),
        );
        Self { fields }
    }

    /// Parse a schema from YAML (`name: { merge: append, default: [] }`)
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Declare a field, refusing to change the strategy of a reserved one
    pub fn declare(&mut self, name: &str, def: StateFieldDef) -> Result<(), BuildError> {
        let reserved = Self::reserved();
        if let Some(existing) = reserved.fields.get(name) {
            if existing.merge != def.merge {
                return Err(BuildError::ReservedField(name.to_string()));
            }
        }
        self.fields.insert(name.to_string(), def);
        Ok(())
    }

    /// Merge strategy of a field; undeclared fields replace
    pub fn merge_strategy(&self, name: &str) -> MergeStrategy {
        self.fields.get(name).map(|d| d.merge).unwrap_or_default()
    }

    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(|d| d.default.as_ref())
    }
}
