//! Per-request context handed to every loader call.

use crate::{StoreError, StoreResult};
use scenery_types::SceneId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Predicate deciding whether documents of a scene may be read.
pub type SceneFilter = Arc<dyn Fn(SceneId) -> bool + Send + Sync>;

/// Request-scoped state: a cancellation flag and an optional scene
/// allow-list.
///
/// Clones share the cancellation flag, so cancelling any clone cancels the
/// request.
#[derive(Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    scenes: Option<SceneFilter>,
}

impl Context {
    /// A context that can read every scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts reads to scenes accepted by `filter`.
    pub fn with_scene_filter(mut self, filter: impl Fn(SceneId) -> bool + Send + Sync + 'static) -> Self {
        self.scenes = Some(Arc::new(filter));
        self
    }

    /// Restricts reads to the listed scenes.
    pub fn with_readable_scenes(self, scenes: impl IntoIterator<Item = SceneId>) -> Self {
        let allowed: HashSet<SceneId> = scenes.into_iter().collect();
        self.with_scene_filter(move |scene| allowed.contains(&scene))
    }

    pub fn can_read(&self, scene: SceneId) -> bool {
        self.scenes.as_ref().is_none_or(|filter| filter(scene))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`StoreError::Cancelled`] once the request is cancelled.
    /// Called at every loader boundary.
    pub fn check(&self) -> StoreResult<()> {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("scene_filter", &self.scenes.is_some())
            .finish()
    }
}
