//! Layers: the nodes of a scene's display tree.
//!
//! A [`Layer`] is either an [`LayerItem`] (leaf) or a [`LayerGroup`]
//! (ordered children). Both share [`LayerCommon`]; they share no behavior.
//! Stored layers arrive as [`LayerDocument`]s and are decoded with
//! `Layer::try_from`, which rejects documents that are both kinds or neither.

use scenery_types::{DatasetId, DatasetSchemaId, InfoboxFieldId, LayerId, PropertyId, SceneId, TagId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_visible() -> bool {
    true
}

/// Fields shared by items and groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCommon {
    pub id: LayerId,
    pub scene: SceneId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infobox: Option<Infobox>,
    #[serde(default, skip_serializing_if = "LayerTagList::is_empty")]
    pub tags: LayerTagList,
}

impl LayerCommon {
    pub fn new(scene: SceneId) -> Self {
        Self {
            id: LayerId::new(),
            scene,
            name: String::new(),
            visible: true,
            plugin_id: None,
            extension_id: None,
            property: None,
            infobox: None,
            tags: LayerTagList::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_property(mut self, property: PropertyId) -> Self {
        self.property = Some(property);
        self
    }

    pub fn with_infobox(mut self, infobox: Infobox) -> Self {
        self.infobox = Some(infobox);
        self
    }

    pub fn with_tags(mut self, tags: LayerTagList) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_extension(mut self, plugin_id: impl Into<String>, extension_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self.extension_id = Some(extension_id.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A layer's detail panel: its own property plus plugin-backed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infobox {
    pub property: PropertyId,
    #[serde(default)]
    pub fields: Vec<InfoboxField>,
}

impl Infobox {
    pub fn new(property: PropertyId) -> Self {
        Self {
            property,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: InfoboxField) -> Self {
        self.fields.push(field);
        self
    }

    /// Every property id referenced by the infobox, its own first.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        std::iter::once(self.property).chain(self.fields.iter().map(|f| f.property))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoboxField {
    pub id: InfoboxFieldId,
    pub plugin_id: String,
    pub extension_id: String,
    pub property: PropertyId,
}

impl InfoboxField {
    pub fn new(plugin_id: impl Into<String>, extension_id: impl Into<String>, property: PropertyId) -> Self {
        Self {
            id: InfoboxFieldId::new(),
            plugin_id: plugin_id.into(),
            extension_id: extension_id.into(),
            property,
        }
    }
}

/// A tag attached to a layer. Group attachments list the child tags chosen
/// for this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerTag {
    Item {
        id: TagId,
    },
    Group {
        id: TagId,
        #[serde(default)]
        children: Vec<TagId>,
    },
}

impl LayerTag {
    pub fn id(&self) -> TagId {
        match self {
            LayerTag::Item { id } | LayerTag::Group { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTagList(Vec<LayerTag>);

impl LayerTagList {
    pub fn new(tags: Vec<LayerTag>) -> Self {
        Self(tags)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerTag> {
        self.0.iter()
    }

    /// Every tag id in the list, group children included.
    pub fn tag_ids(&self) -> impl Iterator<Item = TagId> + '_ {
        self.0.iter().flat_map(|tag| {
            let children: &[TagId] = match tag {
                LayerTag::Item { .. } => &[],
                LayerTag::Group { children, .. } => children,
            };
            std::iter::once(tag.id()).chain(children.iter().copied())
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A leaf layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerItem {
    #[serde(flatten)]
    pub common: LayerCommon,
    /// The dataset record whose values feed this layer's linked fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_dataset: Option<DatasetId>,
}

impl LayerItem {
    pub fn new(common: LayerCommon) -> Self {
        Self {
            common,
            linked_dataset: None,
        }
    }

    pub fn bound_to(mut self, dataset: DatasetId) -> Self {
        self.linked_dataset = Some(dataset);
        self
    }
}

/// A container layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerGroup {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub layers: Vec<LayerId>,
    /// When set, every record of this schema is shown as one child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_dataset_schema: Option<DatasetSchemaId>,
    #[serde(default)]
    pub root: bool,
}

impl LayerGroup {
    pub fn new(common: LayerCommon, layers: Vec<LayerId>) -> Self {
        Self {
            common,
            layers,
            linked_dataset_schema: None,
            root: false,
        }
    }

    pub fn linked_to_schema(mut self, schema: DatasetSchemaId) -> Self {
        self.linked_dataset_schema = Some(schema);
        self
    }

    pub fn as_root(mut self) -> Self {
        self.root = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Item(LayerItem),
    Group(LayerGroup),
}

impl Layer {
    pub fn common(&self) -> &LayerCommon {
        match self {
            Layer::Item(l) => &l.common,
            Layer::Group(l) => &l.common,
        }
    }

    pub fn id(&self) -> LayerId {
        self.common().id
    }

    pub fn scene(&self) -> SceneId {
        self.common().scene
    }

    pub fn property(&self) -> Option<PropertyId> {
        self.common().property
    }

    pub fn infobox(&self) -> Option<&Infobox> {
        self.common().infobox.as_ref()
    }

    pub fn as_item(&self) -> Option<&LayerItem> {
        match self {
            Layer::Item(l) => Some(l),
            Layer::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&LayerGroup> {
        match self {
            Layer::Group(l) => Some(l),
            Layer::Item(_) => None,
        }
    }
}

impl From<LayerItem> for Layer {
    fn from(item: LayerItem) -> Self {
        Layer::Item(item)
    }
}

impl From<LayerGroup> for Layer {
    fn from(group: LayerGroup) -> Self {
        Layer::Group(group)
    }
}

/// Raised when a stored layer document cannot be decoded into a [`Layer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidLayerError {
    #[error("layer {id} is both an item and a group")]
    Ambiguous { id: LayerId },

    #[error("layer {id} is neither an item nor a group")]
    MissingKind { id: LayerId },
}

impl InvalidLayerError {
    pub fn layer_id(&self) -> LayerId {
        match self {
            InvalidLayerError::Ambiguous { id } | InvalidLayerError::MissingKind { id } => *id,
        }
    }
}

/// Item-only part of a stored layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_dataset: Option<DatasetId>,
}

/// Group-only part of a stored layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSection {
    #[serde(default)]
    pub layers: Vec<LayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_dataset_schema: Option<DatasetSchemaId>,
    #[serde(default)]
    pub root: bool,
}

/// A layer as the layer store holds it: common fields plus an item section,
/// a group section, or (when malformed) both or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDocument {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupSection>,
}

impl LayerDocument {
    pub fn id(&self) -> LayerId {
        self.common.id
    }
}

impl TryFrom<LayerDocument> for Layer {
    type Error = InvalidLayerError;

    fn try_from(doc: LayerDocument) -> Result<Self, Self::Error> {
        let id = doc.common.id;
        match (doc.item, doc.group) {
            (Some(item), None) => Ok(Layer::Item(LayerItem {
                common: doc.common,
                linked_dataset: item.linked_dataset,
            })),
            (None, Some(group)) => Ok(Layer::Group(LayerGroup {
                common: doc.common,
                layers: group.layers,
                linked_dataset_schema: group.linked_dataset_schema,
                root: group.root,
            })),
            (Some(_), Some(_)) => Err(InvalidLayerError::Ambiguous { id }),
            (None, None) => Err(InvalidLayerError::MissingKind { id }),
        }
    }
}

impl From<Layer> for LayerDocument {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Item(item) => LayerDocument {
                common: item.common,
                item: Some(ItemSection {
                    linked_dataset: item.linked_dataset,
                }),
                group: None,
            },
            Layer::Group(group) => LayerDocument {
                common: group.common,
                item: None,
                group: Some(GroupSection {
                    layers: group.layers,
                    linked_dataset_schema: group.linked_dataset_schema,
                    root: group.root,
                }),
            },
        }
    }
}
