use crate::StoreResult;
use scenery_model::{Dataset, LayerDocument, Property, Tag};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A serializable dump of every document kind the engine reads.
///
/// Used to seed a [`MemoryStore`](crate::MemoryStore) from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub layers: Vec<LayerDocument>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl StoreSnapshot {
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from(path: &Path) -> StoreResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
