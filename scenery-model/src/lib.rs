//! Document model for Scenery.
//!
//! Defines the documents the layer engine reads:
//! - [`Layer`]: a node of the scene tree, item or group
//! - [`Property`]: a schema-typed bag of fields, some of them bound to
//!   dataset values through [`Links`]
//! - [`Dataset`]: a record of the external data store; `ref` fields make
//!   the store a graph
//! - [`Tag`]: a label attached to layers
//! - [`Value`]: typed literals shared by properties and datasets
//!
//! These types carry no storage or resolution logic. Loading lives in
//! `scenery-store`; merging and sealing live in `scenery-layers`.

mod dataset;
mod layer;
mod property;
mod tag;
mod value;

pub use dataset::{Dataset, DatasetField};
pub use layer::{
    GroupSection, Infobox, InfoboxField, InvalidLayerError, ItemSection, Layer, LayerCommon,
    LayerDocument, LayerGroup, LayerItem, LayerTag, LayerTagList,
};
pub use property::{
    Link, Links, Property, PropertyField, PropertyGroup, PropertyGroupList, PropertyItem,
};
pub use tag::{Tag, TagGroup, TagItem};
pub use value::{LatLng, LatLngHeight, Value, ValueType};

use scenery_types::{PropertyId, PropertyItemId};

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or validating documents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("property {property} has duplicate item {item}")]
    DuplicatePropertyItem {
        property: PropertyId,
        item: PropertyItemId,
    },

    #[error("property {property} group {group} has duplicate field '{field}'")]
    DuplicateField {
        property: PropertyId,
        group: PropertyItemId,
        field: String,
    },

    #[error("a link chain needs at least one link")]
    EmptyLinks,

    #[error(transparent)]
    InvalidLayer(#[from] InvalidLayerError),
}
