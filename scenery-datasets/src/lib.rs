//! Dataset graph traversal for Scenery.
//!
//! Dataset records reference each other through `ref`-typed fields. A
//! property field bound to dataset values names a *path* through that graph:
//! the chain of `ref` fields to follow from a start record before reading the
//! final value. [`GraphWalker`] resolves such paths over any
//! [`DatasetLoader`](scenery_store::DatasetLoader); the seal stage consumes it
//! through the [`DatasetPathResolver`] trait.

mod error;
mod walker;

pub use error::{WalkError, WalkResult};
pub use walker::{DatasetPathResolver, GraphWalker, DEFAULT_MAX_PATH_LENGTH};
