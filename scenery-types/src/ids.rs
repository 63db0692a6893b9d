//! Identifier types used throughout the Scenery engine.
//!
//! Every document kind gets its own newtype over a UUID so a property id can
//! never be handed to a dataset lookup by accident. New ids are UUID v7
//! (time-ordered); ids derived from other ids are UUID v5.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new id with the current timestamp.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an id from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Derives a stable id from a namespace UUID and a name.
            /// The same inputs always produce the same id.
            #[must_use]
            pub fn derive(namespace: Uuid, name: &[u8]) -> Self {
                Self(Uuid::new_v5(&namespace, name))
            }

            /// Parses an id from a string.
            pub fn parse(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|source| Error::InvalidId { kind: $kind, source })
            }

            /// Short name of the id kind, used in log and error messages.
            #[must_use]
            pub const fn kind() -> &'static str {
                $kind
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }
    };
}

define_id!(
    /// Identifier of a scene; the unit of access control.
    SceneId,
    "scene"
);

define_id!(
    /// Identifier of a layer (item or group).
    LayerId,
    "layer"
);

define_id!(
    /// Identifier of a property document.
    PropertyId,
    "property"
);

define_id!(
    /// Identifier of a group or group list inside a property.
    PropertyItemId,
    "property item"
);

define_id!(
    /// Identifier of a field inside a layer's infobox.
    InfoboxFieldId,
    "infobox field"
);

define_id!(
    /// Identifier of a dataset record.
    DatasetId,
    "dataset"
);

define_id!(
    /// Identifier of a dataset schema. Every dataset record belongs to one.
    DatasetSchemaId,
    "dataset schema"
);

define_id!(
    /// Identifier of a field declared by a dataset schema.
    DatasetFieldId,
    "dataset field"
);

define_id!(
    /// Identifier of a tag (item or group).
    TagId,
    "tag"
);
