//! In-memory document store.
//!
//! Implements every loader contract over hash maps. Reads honor the
//! context's scene filter: a document of an unreadable scene behaves exactly
//! like a missing one. Every call is counted so callers can assert on
//! round trips.

use crate::{
    Context, DatasetLoader, LayerLoader, PropertyLoader, StoreError, StoreResult, StoreSnapshot,
    TagLoader,
};
use scenery_model::{Dataset, LayerDocument, Property, Tag};
use scenery_types::{DatasetId, DatasetSchemaId, LayerId, PropertyId, TagId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Number of loader calls served, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub layer_batches: usize,
    pub property_batches: usize,
    pub dataset_loads: usize,
    pub dataset_batches: usize,
    pub schema_scans: usize,
    pub tag_batches: usize,
}

#[derive(Debug, Default)]
struct Counters {
    layer_batches: AtomicUsize,
    property_batches: AtomicUsize,
    dataset_loads: AtomicUsize,
    dataset_batches: AtomicUsize,
    schema_scans: AtomicUsize,
    tag_batches: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Hash-map backed store for tests, fixtures and the export CLI.
#[derive(Debug, Default)]
pub struct MemoryStore {
    layers: HashMap<LayerId, LayerDocument>,
    properties: HashMap<PropertyId, Property>,
    datasets: HashMap<DatasetId, Dataset>,
    tags: HashMap<TagId, Tag>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot, validating every property.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        let mut store = Self::new();
        for layer in snapshot.layers {
            store.insert_layer(layer);
        }
        for property in snapshot.properties {
            property
                .validate()
                .map_err(|e| StoreError::InvalidData(e.to_string()))?;
            store.insert_property(property);
        }
        for dataset in snapshot.datasets {
            store.insert_dataset(dataset);
        }
        for tag in snapshot.tags {
            store.insert_tag(tag);
        }
        debug!(
            "Loaded snapshot: {} layers, {} properties, {} datasets, {} tags",
            store.layers.len(),
            store.properties.len(),
            store.datasets.len(),
            store.tags.len()
        );
        Ok(store)
    }

    /// Dumps the store's documents, sorted by id.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot {
            layers: self.layers.values().cloned().collect(),
            properties: self.properties.values().cloned().collect(),
            datasets: self.datasets.values().cloned().collect(),
            tags: self.tags.values().cloned().collect(),
        };
        snapshot.layers.sort_by_key(LayerDocument::id);
        snapshot.properties.sort_by_key(|p| p.id);
        snapshot.datasets.sort_by_key(|d| d.id);
        snapshot.tags.sort_by_key(Tag::id);
        snapshot
    }

    pub fn insert_layer(&mut self, layer: impl Into<LayerDocument>) {
        let layer = layer.into();
        self.layers.insert(layer.id(), layer);
    }

    pub fn insert_property(&mut self, property: Property) {
        self.properties.insert(property.id, property);
    }

    pub fn insert_dataset(&mut self, dataset: Dataset) {
        self.datasets.insert(dataset.id, dataset);
    }

    pub fn insert_tag(&mut self, tag: Tag) {
        self.tags.insert(tag.id(), tag);
    }

    pub fn remove_property(&mut self, id: PropertyId) -> Option<Property> {
        self.properties.remove(&id)
    }

    pub fn remove_dataset(&mut self, id: DatasetId) -> Option<Dataset> {
        self.datasets.remove(&id)
    }

    pub fn stats(&self) -> LoadStats {
        let c = &self.counters;
        LoadStats {
            layer_batches: c.layer_batches.load(Ordering::Relaxed),
            property_batches: c.property_batches.load(Ordering::Relaxed),
            dataset_loads: c.dataset_loads.load(Ordering::Relaxed),
            dataset_batches: c.dataset_batches.load(Ordering::Relaxed),
            schema_scans: c.schema_scans.load(Ordering::Relaxed),
            tag_batches: c.tag_batches.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        let c = &self.counters;
        for counter in [
            &c.layer_batches,
            &c.property_batches,
            &c.dataset_loads,
            &c.dataset_batches,
            &c.schema_scans,
            &c.tag_batches,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn readable_dataset(&self, ctx: &Context, id: &DatasetId) -> Option<&Dataset> {
        self.datasets.get(id).filter(|d| ctx.can_read(d.scene))
    }
}

impl LayerLoader for MemoryStore {
    fn load_layers(&self, ctx: &Context, ids: &[LayerId]) -> StoreResult<Vec<Option<LayerDocument>>> {
        ctx.check()?;
        bump(&self.counters.layer_batches);
        Ok(ids
            .iter()
            .map(|id| {
                self.layers
                    .get(id)
                    .filter(|l| ctx.can_read(l.common.scene))
                    .cloned()
            })
            .collect())
    }
}

impl PropertyLoader for MemoryStore {
    fn load_properties(&self, ctx: &Context, ids: &[PropertyId]) -> StoreResult<Vec<Property>> {
        ctx.check()?;
        bump(&self.counters.property_batches);
        Ok(ids
            .iter()
            .filter_map(|id| self.properties.get(id))
            .filter(|p| ctx.can_read(p.scene))
            .cloned()
            .collect())
    }
}

impl DatasetLoader for MemoryStore {
    fn load_dataset(&self, ctx: &Context, id: DatasetId) -> StoreResult<Dataset> {
        ctx.check()?;
        bump(&self.counters.dataset_loads);
        self.readable_dataset(ctx, &id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("dataset", id))
    }

    fn load_datasets(&self, ctx: &Context, ids: &[DatasetId]) -> StoreResult<Vec<Dataset>> {
        ctx.check()?;
        bump(&self.counters.dataset_batches);
        Ok(ids
            .iter()
            .filter_map(|id| self.readable_dataset(ctx, id))
            .cloned()
            .collect())
    }

    fn load_datasets_by_schema(&self, ctx: &Context, schema: DatasetSchemaId) -> StoreResult<Vec<Dataset>> {
        ctx.check()?;
        bump(&self.counters.schema_scans);
        let mut found: Vec<Dataset> = self
            .datasets
            .values()
            .filter(|d| d.schema == schema && ctx.can_read(d.scene))
            .cloned()
            .collect();
        found.sort_by_key(|d| d.id);
        Ok(found)
    }
}

impl TagLoader for MemoryStore {
    fn load_tags(&self, ctx: &Context, ids: &[TagId]) -> StoreResult<Vec<Tag>> {
        ctx.check()?;
        bump(&self.counters.tag_batches);
        Ok(ids
            .iter()
            .filter_map(|id| self.tags.get(id))
            .filter(|t| ctx.can_read(t.scene()))
            .cloned()
            .collect())
    }
}
