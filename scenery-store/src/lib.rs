//! Store layer for Scenery.
//!
//! The layer engine never talks to a database directly. It consumes the
//! loader contracts defined here, each a batch lookup by id:
//!
//! - [`LayerLoader`], [`PropertyLoader`], [`TagLoader`]: batch lookups
//! - [`DatasetLoader`]: point, batch and per-schema lookups of records
//!
//! Every call takes a [`Context`] carrying the request's cancellation flag and
//! its scene allow-list. [`MemoryStore`] implements all contracts in memory
//! and can be seeded from a JSON [`StoreSnapshot`].

mod context;
mod error;
mod loader;
mod memory;
mod snapshot;

pub use context::{Context, SceneFilter};
pub use error::{StoreError, StoreResult};
pub use loader::{DatasetLoader, LayerLoader, PropertyLoader, TagLoader};
pub use memory::{LoadStats, MemoryStore};
pub use snapshot::StoreSnapshot;
