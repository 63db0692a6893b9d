//! Error types for dataset path resolution.

use scenery_store::StoreError;
use scenery_types::{DatasetFieldId, DatasetId};
use thiserror::Error;

/// Result type for walker operations.
pub type WalkResult<T> = Result<T, WalkError>;

/// Why a path could not be resolved.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The start record is missing or outside the readable scenes.
    #[error("start dataset not found: {0}")]
    StartNotFound(DatasetId),

    /// The start record has no `ref` field matching the first path entry.
    #[error("dataset {dataset} has no ref field {field}")]
    NotARef {
        dataset: DatasetId,
        field: DatasetFieldId,
    },

    /// No record survived at `depth` (1-based hop count).
    #[error("path broken at depth {depth}")]
    BrokenPath { depth: usize },

    /// More than one record survived at `depth`; the path must be a chain.
    #[error("path ambiguous at depth {depth}: {candidates} candidate records")]
    AmbiguousPath { depth: usize, candidates: usize },

    #[error("path of {len} hops exceeds the limit of {max}")]
    PathTooLong { len: usize, max: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WalkError {
    /// True for failures that must abort the whole request (cancellation,
    /// backend failures) rather than blank a single field.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WalkError::Store(e) if !e.is_not_found())
    }

    /// True when records exist but do not form the requested chain.
    pub fn is_broken_path(&self) -> bool {
        matches!(
            self,
            WalkError::NotARef { .. } | WalkError::BrokenPath { .. } | WalkError::AmbiguousPath { .. }
        )
    }
}
