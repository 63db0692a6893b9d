//! Output of the seal stage: every value concrete, every tag labelled.

use scenery_datasets::WalkError;
use scenery_model::{Value, ValueType};
use scenery_types::{DatasetFieldId, DatasetId, DatasetSchemaId, InfoboxFieldId, LayerId, PropertyId, PropertyItemId, SceneId, TagId};
use serde::Serialize;
use thiserror::Error;

/// Where a sealed field's value came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// The field has no dataset links; the value is the merged literal.
    Literal,
    /// Read from a dataset record.
    Dataset { dataset: DatasetId },
    /// The links could not be followed; the value is the merged literal.
    Fallback { failure: LinkFailure },
}

/// Why a field's dataset links did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LinkFailure {
    #[error("no start dataset: the links name none and the layer is not bound to one")]
    NoStartDataset,

    #[error("dataset {dataset} not found")]
    DatasetNotFound { dataset: DatasetId },

    #[error("dataset {dataset} has no ref field {field}")]
    NotARef { dataset: DatasetId, field: DatasetFieldId },

    #[error("path broken at depth {depth}")]
    BrokenPath { depth: usize },

    #[error("path ambiguous at depth {depth}: {candidates} candidates")]
    AmbiguousPath { depth: usize, candidates: usize },

    #[error("path of {len} hops exceeds the limit of {max}")]
    PathTooLong { len: usize, max: usize },

    #[error("dataset {dataset} has schema {found}, link expects {expected}")]
    SchemaMismatch {
        dataset: DatasetId,
        expected: DatasetSchemaId,
        found: DatasetSchemaId,
    },

    #[error("dataset {dataset} has no field {field}")]
    MissingField { dataset: DatasetId, field: DatasetFieldId },

    #[error("dataset {dataset} field {field} is empty")]
    EmptyValue { dataset: DatasetId, field: DatasetFieldId },

    #[error("dataset {dataset} field {field} is {found:?}, cannot be read as {expected:?}")]
    TypeMismatch {
        dataset: DatasetId,
        field: DatasetFieldId,
        expected: ValueType,
        found: ValueType,
    },
}

impl LinkFailure {
    /// Maps a non-fatal walk error. `start` is the record the walk began at.
    pub(crate) fn from_walk(err: &WalkError, start: DatasetId) -> Self {
        match err {
            WalkError::StartNotFound(dataset) => LinkFailure::DatasetNotFound { dataset: *dataset },
            WalkError::NotARef { dataset, field } => LinkFailure::NotARef {
                dataset: *dataset,
                field: *field,
            },
            WalkError::BrokenPath { depth } => LinkFailure::BrokenPath { depth: *depth },
            WalkError::AmbiguousPath { depth, candidates } => LinkFailure::AmbiguousPath {
                depth: *depth,
                candidates: *candidates,
            },
            WalkError::PathTooLong { len, max } => LinkFailure::PathTooLong { len: *len, max: *max },
            WalkError::Store(_) => LinkFailure::DatasetNotFound { dataset: start },
        }
    }

    /// True when records exist but do not chain the way the links describe.
    pub fn is_broken_path(&self) -> bool {
        matches!(
            self,
            LinkFailure::NotARef { .. }
                | LinkFailure::BrokenPath { .. }
                | LinkFailure::AmbiguousPath { .. }
                | LinkFailure::SchemaMismatch { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedField {
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: Option<Value>,
    pub source: ValueSource,
}

impl SealedField {
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn from_dataset(&self) -> bool {
        matches!(self.source, ValueSource::Dataset { .. })
    }

    pub fn failure(&self) -> Option<&LinkFailure> {
        match &self.source {
            ValueSource::Fallback { failure } => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedGroup {
    pub id: PropertyItemId,
    pub schema_group: String,
    pub fields: Vec<SealedField>,
}

impl SealedGroup {
    pub fn field(&self, field: &str) -> Option<&SealedField> {
        self.fields.iter().find(|f| f.field == field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedGroupList {
    pub id: PropertyItemId,
    pub schema_group: String,
    pub groups: Vec<SealedGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SealedItem {
    Group(SealedGroup),
    GroupList(SealedGroupList),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SealedProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<PropertyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PropertyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_dataset: Option<DatasetId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub items: Vec<SealedItem>,
}

impl SealedProperty {
    pub fn group(&self, schema_group: &str) -> Option<&SealedGroup> {
        self.items.iter().find_map(|item| match item {
            SealedItem::Group(g) if g.schema_group == schema_group => Some(g),
            _ => None,
        })
    }

    pub fn group_list(&self, schema_group: &str) -> Option<&SealedGroupList> {
        self.items.iter().find_map(|item| match item {
            SealedItem::GroupList(l) if l.schema_group == schema_group => Some(l),
            _ => None,
        })
    }

    /// Looks up a field of a plain group.
    pub fn field(&self, schema_group: &str, field: &str) -> Option<&SealedField> {
        self.group(schema_group).and_then(|g| g.field(field))
    }

    /// Shorthand for the value of [`field`](Self::field).
    pub fn value(&self, schema_group: &str, field: &str) -> Option<&Value> {
        self.field(schema_group, field).and_then(|f| f.value.as_ref())
    }

    /// Every field of every group, group lists expanded.
    pub fn fields(&self) -> impl Iterator<Item = &SealedField> {
        self.items
            .iter()
            .flat_map(|item| match item {
                SealedItem::Group(g) => std::slice::from_ref(g).iter(),
                SealedItem::GroupList(l) => l.groups.iter(),
            })
            .flat_map(|g| g.fields.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SealedField, &LinkFailure)> {
        self.fields().filter_map(|f| f.failure().map(|failure| (f, failure)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedInfobox {
    pub property: SealedProperty,
    pub fields: Vec<SealedInfoboxField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedInfoboxField {
    pub id: InfoboxFieldId,
    pub plugin_id: String,
    pub extension_id: String,
    pub property: SealedProperty,
}

/// A tag attached to a layer, with its label. Group tags list the attached
/// child tags. Tags that could not be loaded keep an empty label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SealedTag {
    pub id: TagId,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<SealedTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedLayerCommon {
    pub id: LayerId,
    pub scene: SceneId,
    pub name: String,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_id: Option<String>,
    pub property: SealedProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infobox: Option<SealedInfobox>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<SealedTag>,
}

impl SealedLayerCommon {
    /// The layer property followed by the infobox property and each infobox
    /// field's property.
    pub fn properties(&self) -> impl Iterator<Item = &SealedProperty> {
        std::iter::once(&self.property).chain(self.infobox.iter().flat_map(|infobox| {
            std::iter::once(&infobox.property).chain(infobox.fields.iter().map(|f| &f.property))
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedLayerItem {
    #[serde(flatten)]
    pub common: SealedLayerCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_dataset: Option<DatasetId>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub spawned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealedLayerGroup {
    #[serde(flatten)]
    pub common: SealedLayerCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_dataset_schema: Option<DatasetSchemaId>,
    pub root: bool,
    pub children: Vec<SealedLayer>,
}

/// A fully resolved layer tree, ready for an exporter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SealedLayer {
    Item(SealedLayerItem),
    Group(SealedLayerGroup),
}

impl SealedLayer {
    pub fn common(&self) -> &SealedLayerCommon {
        match self {
            SealedLayer::Item(l) => &l.common,
            SealedLayer::Group(l) => &l.common,
        }
    }

    pub fn id(&self) -> LayerId {
        self.common().id
    }

    pub fn property(&self) -> &SealedProperty {
        &self.common().property
    }

    /// Looks up a resolved field of the layer's property.
    pub fn field(&self, schema_group: &str, field: &str) -> Option<&SealedField> {
        self.property().field(schema_group, field)
    }

    pub fn as_item(&self) -> Option<&SealedLayerItem> {
        match self {
            SealedLayer::Item(l) => Some(l),
            SealedLayer::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&SealedLayerGroup> {
        match self {
            SealedLayer::Group(l) => Some(l),
            SealedLayer::Item(_) => None,
        }
    }

    /// The node itself followed by every descendant, depth first.
    pub fn walk(&self) -> Vec<&SealedLayer> {
        let mut out = vec![self];
        if let SealedLayer::Group(group) = self {
            for child in &group.children {
                out.extend(child.walk());
            }
        }
        out
    }

    /// Every field in the tree that fell back to its literal, across layer,
    /// infobox and infobox field properties of groups and items alike.
    pub fn failures(&self) -> Vec<(&SealedField, &LinkFailure)> {
        self.walk()
            .into_iter()
            .flat_map(|node| node.common().properties())
            .flat_map(|property| property.failures())
            .collect()
    }

    /// Every item in the tree, in depth-first order. An item returns itself.
    pub fn flatten(&self) -> Vec<&SealedLayerItem> {
        let mut out = Vec::new();
        self.collect_items(&mut out);
        out
    }

    fn collect_items<'s>(&'s self, out: &mut Vec<&'s SealedLayerItem>) {
        match self {
            SealedLayer::Item(item) => out.push(item),
            SealedLayer::Group(group) => {
                for child in &group.children {
                    child.collect_items(out);
                }
            }
        }
    }

    /// Finds a node by id anywhere in the tree.
    pub fn find(&self, id: LayerId) -> Option<&SealedLayer> {
        if self.id() == id {
            return Some(self);
        }
        self.as_group()?.children.iter().find_map(|c| c.find(id))
    }
}
