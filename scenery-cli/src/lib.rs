//! Snapshot loading and JSON export for the `scenery-export` binary.

use anyhow::{Context as _, Result};
use scenery_layers::{Engine, EngineConfig, SealedLayer, SealedLayerItem};
use scenery_store::{Context, MemoryStore, StoreSnapshot};
use scenery_types::{LayerId, SceneId};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// What to export and how.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub layer: LayerId,
    /// Scenes the request may read. Empty means all.
    pub scenes: Vec<SceneId>,
    /// Emit the item list instead of the tree.
    pub flatten: bool,
    pub config: EngineConfig,
}

impl ExportOptions {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            scenes: Vec::new(),
            flatten: false,
            config: EngineConfig::default(),
        }
    }

    fn context(&self) -> Context {
        if self.scenes.is_empty() {
            Context::new()
        } else {
            Context::new().with_readable_scenes(self.scenes.iter().copied())
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Export<'a> {
    Tree(&'a SealedLayer),
    Items(Vec<&'a SealedLayerItem>),
}

/// Reads a JSON snapshot into a store.
pub fn load_store(path: &Path) -> Result<MemoryStore> {
    let snapshot = StoreSnapshot::load_from(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    MemoryStore::from_snapshot(snapshot).context("Snapshot contains invalid documents")
}

/// Resolves the requested layer and renders it as JSON.
pub fn export(store: &MemoryStore, options: &ExportOptions) -> Result<serde_json::Value> {
    let engine = Engine::from_store(store).with_config(options.config.clone());
    let sealed = engine
        .resolve(&options.context(), options.layer)
        .with_context(|| format!("Failed to resolve layer {}", options.layer))?;

    let export = if options.flatten {
        let items = sealed.flatten();
        info!("Exporting {} items", items.len());
        Export::Items(items)
    } else {
        Export::Tree(&sealed)
    };
    serde_json::to_value(&export).context("Failed to serialize export")
}
