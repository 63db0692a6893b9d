//! Layer property resolution for Scenery.
//!
//! Computes the effective property and infobox values of every node in a
//! layer tree in two passes:
//!
//! 1. **Merge** ([`Merger`]): each node's own property is overlaid on the one
//!    inherited from its parent group. Dataset links are carried along
//!    unresolved.
//! 2. **Seal** ([`Sealer`]): every link is followed through the dataset graph
//!    and replaced with the value it names, falling back to the literal when
//!    it can't be followed. Tag labels are attached.
//!
//! [`Engine`] wires both passes to a set of loaders and an [`EngineConfig`].
//!
//! ```ignore
//! let engine = Engine::from_store(&store).with_config(config);
//! let sealed = engine.resolve(&Context::new(), root)?;
//! for item in sealed.flatten() {
//!     println!("{}: {:?}", item.common.name, item.common.property.value("default", "color"));
//! }
//! ```

mod config;
mod engine;
mod error;
mod merge;
mod merged;
mod seal;
mod sealed;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use merge::Merger;
pub use merged::{
    merge_property, MergedField, MergedGroup, MergedGroupList, MergedInfobox, MergedInfoboxField, MergedItem,
    MergedLayer, MergedLayerCommon, MergedLayerGroup, MergedLayerItem, MergedMetadata, MergedProperty,
};
pub use seal::Sealer;
pub use sealed::{
    LinkFailure, SealedField, SealedGroup, SealedGroupList, SealedInfobox, SealedInfoboxField, SealedItem,
    SealedLayer, SealedLayerCommon, SealedLayerGroup, SealedLayerItem, SealedProperty, SealedTag, ValueSource,
};
