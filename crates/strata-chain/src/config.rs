//! Database options

use crate::error::{ChainResult, GenesisError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of applied blocks that can be popped
pub const DEFAULT_MAX_UNDO_HISTORY: usize = 1024;

/// Options for opening a [`Database`](crate::Database)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Most recent blocks kept undoable for fork switching
    pub max_undo_history: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_undo_history: DEFAULT_MAX_UNDO_HISTORY,
        }
    }
}

impl DatabaseConfig {
    /// Parse from TOML
    pub fn from_toml_str(s: &str) -> ChainResult<Self> {
        toml::from_str(s).map_err(|e| GenesisError::Config(e.to_string()).into())
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ChainResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GenesisError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&text)
    }
}
