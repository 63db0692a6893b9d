//! Engine configuration, read from a TOML file.
//!
//! ```toml
//! max_path_length = 8
//! spawn_linked_children = false
//! ```

use crate::EngineResult;
use scenery_datasets::DEFAULT_MAX_PATH_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest dataset link chain a field may follow. Longer chains resolve
    /// to their literal fallback.
    pub max_path_length: usize,
    /// Whether groups linked to a dataset schema show one child per record.
    pub spawn_linked_children: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            spawn_linked_children: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> EngineResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from `path`. A missing file yields the defaults;
    /// a malformed one is an error.
    pub fn load_from(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            warn!("No engine config found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded engine config from {:?}", path);
        Ok(config)
    }
}
