//! Error types for the layer engine.

use scenery_model::InvalidLayerError;
use scenery_store::StoreError;
use scenery_types::LayerId;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort a merge or seal.
///
/// Problems with referenced-but-optional documents (a parent's property, a
/// dataset link, a tag) never surface here; they degrade the affected value
/// and are logged instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested root layer does not exist or is not readable.
    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),

    /// The requested root layer is structurally malformed.
    #[error("invalid layer: {0}")]
    InvalidLayer(#[from] InvalidLayerError),

    /// A loader failed or the request was cancelled.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::Cancelled))
    }
}
