use crate::merge::Merger;
use crate::merged::MergedLayer;
use crate::seal::Sealer;
use crate::sealed::SealedLayer;
use crate::{EngineConfig, EngineResult};
use scenery_datasets::GraphWalker;
use scenery_store::{Context, DatasetLoader, LayerLoader, PropertyLoader, TagLoader};
use scenery_types::LayerId;
use tracing::{debug, info};

/// Resolves layer trees against a set of loaders.
///
/// An engine holds no per-request state; every call builds its trees from
/// scratch and may run against a different [`Context`].
pub struct Engine<'a> {
    layers: &'a dyn LayerLoader,
    properties: &'a dyn PropertyLoader,
    datasets: &'a dyn DatasetLoader,
    tags: &'a dyn TagLoader,
    config: EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        layers: &'a dyn LayerLoader,
        properties: &'a dyn PropertyLoader,
        datasets: &'a dyn DatasetLoader,
        tags: &'a dyn TagLoader,
    ) -> Self {
        Self {
            layers,
            properties,
            datasets,
            tags,
            config: EngineConfig::default(),
        }
    }

    /// Uses one backend for every loader.
    pub fn from_store<S>(store: &'a S) -> Self
    where
        S: LayerLoader + PropertyLoader + DatasetLoader + TagLoader,
    {
        Self::new(store, store, store, store)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the merge stage for `root` and its descendants.
    pub fn merge(&self, ctx: &Context, root: LayerId) -> EngineResult<MergedLayer> {
        Merger::new(ctx, self.layers, self.properties, self.datasets, &self.config).merge_root(root)
    }

    /// Runs the seal stage over a merged tree.
    pub fn seal(&self, ctx: &Context, merged: &MergedLayer) -> EngineResult<SealedLayer> {
        let walker = GraphWalker::new(self.datasets).with_max_path_length(self.config.max_path_length);
        Sealer::new(ctx, &walker, self.tags).seal(merged)
    }

    /// Merges and seals `root`.
    pub fn resolve(&self, ctx: &Context, root: LayerId) -> EngineResult<SealedLayer> {
        debug!("Resolving layer {}", root);
        let merged = self.merge(ctx, root)?;
        let sealed = self.seal(ctx, &merged)?;
        info!(
            "Resolved layer {}: {} items, {} link fallbacks",
            root,
            sealed.flatten().len(),
            sealed.failures().len()
        );
        Ok(sealed)
    }
}
