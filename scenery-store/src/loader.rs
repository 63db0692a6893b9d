//! Loader contracts the engine consumes.
//!
//! Every loader is a plain synchronous call from a [`Context`] and a list of
//! ids to documents. The single-method loaders are implemented for closures
//! so callers can wire the engine to any backend without a wrapper type.

use crate::{Context, StoreResult};
use scenery_model::{Dataset, LayerDocument, Property, Tag};
use scenery_types::{DatasetId, DatasetSchemaId, LayerId, PropertyId, TagId};

/// Batch lookup of layer documents.
pub trait LayerLoader {
    /// Returns one entry per requested id, in request order. `None` marks a
    /// missing or unreadable layer.
    fn load_layers(&self, ctx: &Context, ids: &[LayerId]) -> StoreResult<Vec<Option<LayerDocument>>>;
}

/// Batch lookup of property documents.
pub trait PropertyLoader {
    /// Returns the documents that were found, in any order. Missing ids are
    /// simply absent from the result.
    fn load_properties(&self, ctx: &Context, ids: &[PropertyId]) -> StoreResult<Vec<Property>>;
}

/// Lookup of dataset records.
pub trait DatasetLoader {
    /// Loads one record. Fails with `NotFound` when it is missing or
    /// unreadable.
    fn load_dataset(&self, ctx: &Context, id: DatasetId) -> StoreResult<Dataset>;

    /// Loads many records in one round trip. Missing ids are skipped.
    fn load_datasets(&self, ctx: &Context, ids: &[DatasetId]) -> StoreResult<Vec<Dataset>>;

    /// Loads every record of a schema, in a stable order.
    fn load_datasets_by_schema(&self, ctx: &Context, schema: DatasetSchemaId) -> StoreResult<Vec<Dataset>>;
}

/// Batch lookup of tags.
pub trait TagLoader {
    /// Returns the tags that were found, in any order.
    fn load_tags(&self, ctx: &Context, ids: &[TagId]) -> StoreResult<Vec<Tag>>;
}

impl<F> LayerLoader for F
where
    F: Fn(&Context, &[LayerId]) -> StoreResult<Vec<Option<LayerDocument>>>,
{
    fn load_layers(&self, ctx: &Context, ids: &[LayerId]) -> StoreResult<Vec<Option<LayerDocument>>> {
        self(ctx, ids)
    }
}

impl<F> PropertyLoader for F
where
    F: Fn(&Context, &[PropertyId]) -> StoreResult<Vec<Property>>,
{
    fn load_properties(&self, ctx: &Context, ids: &[PropertyId]) -> StoreResult<Vec<Property>> {
        self(ctx, ids)
    }
}

impl<F> TagLoader for F
where
    F: Fn(&Context, &[TagId]) -> StoreResult<Vec<Tag>>,
{
    fn load_tags(&self, ctx: &Context, ids: &[TagId]) -> StoreResult<Vec<Tag>> {
        self(ctx, ids)
    }
}
