//! Output of the merge stage.
//!
//! A merged node still describes values symbolically: each field carries the
//! winning literal and the winning dataset links, but no link has been
//! followed yet. Sealing turns these into [`crate::SealedLayer`]s.

use scenery_model::{
    LayerTagList, Links, Property, PropertyField, PropertyGroup, PropertyItem, Value, ValueType,
};
use scenery_types::{DatasetId, DatasetSchemaId, InfoboxFieldId, LayerId, PropertyId, PropertyItemId, SceneId};
use std::collections::HashSet;

/// Which documents feed one merged property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergedMetadata {
    /// The node's own property.
    pub original: Option<PropertyId>,
    /// The property inherited from the parent group.
    pub parent: Option<PropertyId>,
    /// The record linked fields start from when their links don't name one.
    pub linked_dataset: Option<DatasetId>,
}

impl MergedMetadata {
    pub fn new(original: Option<PropertyId>, parent: Option<PropertyId>, linked_dataset: Option<DatasetId>) -> Self {
        Self {
            original,
            parent,
            linked_dataset,
        }
    }

    /// Property ids this plan needs loaded.
    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> {
        self.original.into_iter().chain(self.parent)
    }

    /// Picks the original and parent documents out of `loaded` and merges
    /// them. Ids that were not loaded count as absent.
    pub fn merge(&self, loaded: &[Property]) -> MergedProperty {
        let mut original = None;
        let mut parent = None;
        for property in loaded {
            if original.is_none() && self.original == Some(property.id) {
                original = Some(property);
            }
            if parent.is_none() && self.parent == Some(property.id) {
                parent = Some(property);
            }
            let original_done = self.original.is_none() || original.is_some();
            let parent_done = self.parent.is_none() || parent.is_some();
            if original_done && parent_done {
                break;
            }
        }
        merge_property(self, original, parent)
    }
}

/// Merges an original and a parent property. Own values win over inherited
/// ones field by field; fields present on either side are all kept.
pub fn merge_property(
    metadata: &MergedMetadata,
    original: Option<&Property>,
    parent: Option<&Property>,
) -> MergedProperty {
    let schema = original.or(parent).map(|p| p.schema.clone());
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for item in original.into_iter().flat_map(|p| p.items.iter()) {
        if !seen.insert(item.schema_group()) {
            continue;
        }
        let inherited = parent.and_then(|p| p.item(item.schema_group()));
        items.push(merge_item(item, inherited));
    }
    for item in parent.into_iter().flat_map(|p| p.items.iter()) {
        if seen.insert(item.schema_group()) {
            items.push(inherit_item(item));
        }
    }

    MergedProperty {
        original: original.map(|p| p.id),
        parent: parent.map(|p| p.id),
        linked_dataset: metadata.linked_dataset,
        schema,
        items,
    }
}

fn merge_item(original: &PropertyItem, parent: Option<&PropertyItem>) -> MergedItem {
    match original {
        PropertyItem::Group(o) => MergedItem::Group(merge_group(Some(o), parent.and_then(PropertyItem::as_group))),
        PropertyItem::GroupList(o) => {
            let inherited = parent.and_then(PropertyItem::as_group_list);
            // A list is inherited whole or not at all.
            let (groups, from_parent) = match inherited {
                Some(list) if o.groups.is_empty() => (&list.groups, true),
                _ => (&o.groups, false),
            };
            MergedItem::GroupList(MergedGroupList {
                id: o.id,
                schema_group: o.schema_group.clone(),
                original: Some(o.id),
                parent: inherited.map(|l| l.id),
                groups: groups
                    .iter()
                    .map(|g| {
                        if from_parent {
                            merge_group(None, Some(g))
                        } else {
                            merge_group(Some(g), None)
                        }
                    })
                    .collect(),
            })
        }
    }
}

/// An item only the parent has.
fn inherit_item(parent: &PropertyItem) -> MergedItem {
    match parent {
        PropertyItem::Group(p) => MergedItem::Group(merge_group(None, Some(p))),
        PropertyItem::GroupList(p) => MergedItem::GroupList(MergedGroupList {
            id: p.id,
            schema_group: p.schema_group.clone(),
            original: None,
            parent: Some(p.id),
            groups: p.groups.iter().map(|g| merge_group(None, Some(g))).collect(),
        }),
    }
}

fn merge_group(original: Option<&PropertyGroup>, parent: Option<&PropertyGroup>) -> MergedGroup {
    let base = original.or(parent);
    let mut fields: Vec<MergedField> = Vec::new();
    for field in original.into_iter().flat_map(|g| g.fields.iter()) {
        let inherited = parent.and_then(|p| p.field(&field.field));
        fields.push(merge_field(Some(field), inherited));
    }
    for field in parent.into_iter().flat_map(|g| g.fields.iter()) {
        if original.and_then(|o| o.field(&field.field)).is_none() {
            fields.push(merge_field(None, Some(field)));
        }
    }
    MergedGroup {
        id: base.map(|g| g.id).unwrap_or_default(),
        schema_group: base.map(|g| g.schema_group.clone()).unwrap_or_default(),
        original: original.map(|g| g.id),
        parent: parent.map(|g| g.id),
        fields,
    }
}

fn merge_field(original: Option<&PropertyField>, parent: Option<&PropertyField>) -> MergedField {
    let own_value = original.and_then(|f| f.value.clone());
    let inherited_value = parent.and_then(|f| f.value.clone());
    let overridden = own_value.is_some() && inherited_value.is_some();
    // Only reachable with at least one side present.
    let base = original.or(parent);
    MergedField {
        field: base.map(|f| f.field.clone()).unwrap_or_default(),
        value_type: base.map(|f| f.value_type).unwrap_or(ValueType::String),
        value: own_value.or(inherited_value),
        links: original
            .and_then(|f| f.links.clone())
            .or_else(|| parent.and_then(|f| f.links.clone())),
        overridden,
    }
}

/// A property after inheritance, before dataset links are followed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedProperty {
    pub original: Option<PropertyId>,
    pub parent: Option<PropertyId>,
    pub linked_dataset: Option<DatasetId>,
    /// Schema of whichever document contributed; `None` when neither did.
    pub schema: Option<String>,
    pub items: Vec<MergedItem>,
}

impl MergedProperty {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn group(&self, schema_group: &str) -> Option<&MergedGroup> {
        self.items.iter().find_map(|item| match item {
            MergedItem::Group(g) if g.schema_group == schema_group => Some(g),
            _ => None,
        })
    }

    pub fn field(&self, schema_group: &str, field: &str) -> Option<&MergedField> {
        self.group(schema_group).and_then(|g| g.field(field))
    }

    /// Every field of every group, group lists expanded.
    pub fn fields(&self) -> impl Iterator<Item = &MergedField> {
        self.items
            .iter()
            .flat_map(|item| match item {
                MergedItem::Group(g) => std::slice::from_ref(g).iter(),
                MergedItem::GroupList(l) => l.groups.iter(),
            })
            .flat_map(|g| g.fields.iter())
    }

    pub fn has_links(&self) -> bool {
        self.fields().any(|f| f.links.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergedItem {
    Group(MergedGroup),
    GroupList(MergedGroupList),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedGroup {
    pub id: PropertyItemId,
    pub schema_group: String,
    pub original: Option<PropertyItemId>,
    pub parent: Option<PropertyItemId>,
    pub fields: Vec<MergedField>,
}

impl MergedGroup {
    pub fn field(&self, field: &str) -> Option<&MergedField> {
        self.fields.iter().find(|f| f.field == field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroupList {
    pub id: PropertyItemId,
    pub schema_group: String,
    pub original: Option<PropertyItemId>,
    pub parent: Option<PropertyItemId>,
    pub groups: Vec<MergedGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedField {
    pub field: String,
    pub value_type: ValueType,
    /// Literal value; the fallback when links are present.
    pub value: Option<Value>,
    pub links: Option<Links>,
    /// The node's own value hides an inherited one.
    pub overridden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedInfobox {
    pub property: MergedProperty,
    pub fields: Vec<MergedInfoboxField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedInfoboxField {
    pub id: InfoboxFieldId,
    pub plugin_id: String,
    pub extension_id: String,
    pub property: MergedProperty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedLayerCommon {
    pub id: LayerId,
    pub scene: SceneId,
    pub name: String,
    pub visible: bool,
    pub plugin_id: Option<String>,
    pub extension_id: Option<String>,
    pub property: MergedProperty,
    pub infobox: Option<MergedInfobox>,
    pub tags: LayerTagList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedLayerItem {
    pub common: MergedLayerCommon,
    pub linked_dataset: Option<DatasetId>,
    /// Spawned from a linked group's schema rather than stored.
    pub spawned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedLayerGroup {
    pub common: MergedLayerCommon,
    pub linked_dataset_schema: Option<DatasetSchemaId>,
    pub root: bool,
    pub children: Vec<MergedLayer>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergedLayer {
    Item(MergedLayerItem),
    Group(MergedLayerGroup),
}

impl MergedLayer {
    pub fn common(&self) -> &MergedLayerCommon {
        match self {
            MergedLayer::Item(l) => &l.common,
            MergedLayer::Group(l) => &l.common,
        }
    }

    pub fn id(&self) -> LayerId {
        self.common().id
    }

    pub fn property(&self) -> &MergedProperty {
        &self.common().property
    }

    pub fn as_item(&self) -> Option<&MergedLayerItem> {
        match self {
            MergedLayer::Item(l) => Some(l),
            MergedLayer::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&MergedLayerGroup> {
        match self {
            MergedLayer::Group(l) => Some(l),
            MergedLayer::Item(_) => None,
        }
    }

    /// The node itself followed by every descendant, depth first.
    pub fn walk(&self) -> Vec<&MergedLayer> {
        let mut out = vec![self];
        if let MergedLayer::Group(group) = self {
            for child in &group.children {
                out.extend(child.walk());
            }
        }
        out
    }
}
