//! Core identifier types for Scenery.
//!
//! This crate defines the typed identifiers shared by every other crate in
//! the workspace: scenes, layers, properties, infobox fields, datasets and
//! their schemas, and tags. Document shapes live in `scenery-model`.

mod ids;

pub use ids::{
    DatasetFieldId, DatasetId, DatasetSchemaId, InfoboxFieldId, LayerId, PropertyId,
    PropertyItemId, SceneId, TagId,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {kind} id: {source}")]
    InvalidId {
        kind: &'static str,
        #[source]
        source: uuid::Error,
    },
}
