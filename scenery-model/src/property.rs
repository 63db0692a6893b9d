use crate::{ModelError, ModelResult, Value, ValueType};
use scenery_types::{DatasetFieldId, DatasetId, DatasetSchemaId, PropertyId, PropertyItemId, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A schema-typed bag of fields attached to a layer, an infobox, or an
/// infobox field.
///
/// The schema itself is owned by the plugin system; a property only carries
/// the schema's id and the values filled in for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub scene: SceneId,
    pub schema: String,
    #[serde(default)]
    pub items: Vec<PropertyItem>,
}

impl Property {
    /// Creates an empty property with a fresh id.
    pub fn new(scene: SceneId, schema: impl Into<String>) -> Self {
        Self {
            id: PropertyId::new(),
            scene,
            schema: schema.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<PropertyItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Checks that item ids are unique within the property and field ids are
    /// unique within each group.
    pub fn validate(&self) -> ModelResult<()> {
        let mut item_ids = HashSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id()) {
                return Err(ModelError::DuplicatePropertyItem {
                    property: self.id,
                    item: item.id(),
                });
            }
            let groups: Vec<&PropertyGroup> = match item {
                PropertyItem::Group(group) => vec![group],
                PropertyItem::GroupList(list) => {
                    for group in &list.groups {
                        if !item_ids.insert(group.id) {
                            return Err(ModelError::DuplicatePropertyItem {
                                property: self.id,
                                item: group.id,
                            });
                        }
                    }
                    list.groups.iter().collect()
                }
            };
            for group in groups {
                let mut field_ids = HashSet::new();
                for field in &group.fields {
                    if !field_ids.insert(field.field.as_str()) {
                        return Err(ModelError::DuplicateField {
                            property: self.id,
                            group: group.id,
                            field: field.field.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the first item bound to the given schema group.
    pub fn item(&self, schema_group: &str) -> Option<&PropertyItem> {
        self.items.iter().find(|i| i.schema_group() == schema_group)
    }

    /// Returns the group bound to the given schema group, if it is a plain group.
    pub fn group(&self, schema_group: &str) -> Option<&PropertyGroup> {
        self.item(schema_group).and_then(PropertyItem::as_group)
    }

    /// Looks up a field of a plain group by schema group and field id.
    pub fn field(&self, schema_group: &str, field: &str) -> Option<&PropertyField> {
        self.group(schema_group).and_then(|g| g.field(field))
    }

    /// Iterates every group, expanding group lists in order.
    pub fn groups(&self) -> impl Iterator<Item = &PropertyGroup> {
        self.items.iter().flat_map(|item| match item {
            PropertyItem::Group(group) => std::slice::from_ref(group).iter(),
            PropertyItem::GroupList(list) => list.groups.iter(),
        })
    }

    /// Iterates every field of every group, including groups inside lists.
    pub fn fields(&self) -> impl Iterator<Item = &PropertyField> {
        self.groups().flat_map(|g| g.fields.iter())
    }

    /// Returns true if any field is bound to dataset values.
    pub fn has_links(&self) -> bool {
        self.fields().any(PropertyField::is_linked)
    }
}

/// A top-level entry of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyItem {
    Group(PropertyGroup),
    /// Ordered list of groups sharing one schema group, for repeating
    /// structures such as polygon rings or infobox rows.
    GroupList(PropertyGroupList),
}

impl PropertyItem {
    pub fn id(&self) -> PropertyItemId {
        match self {
            PropertyItem::Group(g) => g.id,
            PropertyItem::GroupList(l) => l.id,
        }
    }

    pub fn schema_group(&self) -> &str {
        match self {
            PropertyItem::Group(g) => &g.schema_group,
            PropertyItem::GroupList(l) => &l.schema_group,
        }
    }

    pub fn as_group(&self) -> Option<&PropertyGroup> {
        match self {
            PropertyItem::Group(g) => Some(g),
            PropertyItem::GroupList(_) => None,
        }
    }

    pub fn as_group_list(&self) -> Option<&PropertyGroupList> {
        match self {
            PropertyItem::GroupList(l) => Some(l),
            PropertyItem::Group(_) => None,
        }
    }
}

impl From<PropertyGroup> for PropertyItem {
    fn from(group: PropertyGroup) -> Self {
        PropertyItem::Group(group)
    }
}

impl From<PropertyGroupList> for PropertyItem {
    fn from(list: PropertyGroupList) -> Self {
        PropertyItem::GroupList(list)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyGroup {
    pub id: PropertyItemId,
    pub schema_group: String,
    #[serde(default)]
    pub fields: Vec<PropertyField>,
}

impl PropertyGroup {
    pub fn new(schema_group: impl Into<String>) -> Self {
        Self {
            id: PropertyItemId::new(),
            schema_group: schema_group.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: PropertyField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, field: &str) -> Option<&PropertyField> {
        self.fields.iter().find(|f| f.field == field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyGroupList {
    pub id: PropertyItemId,
    pub schema_group: String,
    #[serde(default)]
    pub groups: Vec<PropertyGroup>,
}

impl PropertyGroupList {
    pub fn new(schema_group: impl Into<String>) -> Self {
        Self {
            id: PropertyItemId::new(),
            schema_group: schema_group.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: PropertyGroup) -> Self {
        self.groups.push(group);
        self
    }
}

/// A single slot of a property group.
///
/// A field holds a literal value, dataset links naming where the value
/// should come from, both (the literal is the fallback), or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyField {
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl PropertyField {
    pub fn new(field: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            field: field.into(),
            value_type,
            value: None,
            links: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = Some(links);
        self
    }

    pub fn is_linked(&self) -> bool {
        self.links.is_some()
    }
}

/// One hop of a dataset link: a schema, an optional concrete record, and the
/// field to read (or follow) on that record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<DatasetId>,
    pub schema: DatasetSchemaId,
    pub field: DatasetFieldId,
}

impl Link {
    pub fn new(schema: DatasetSchemaId, field: DatasetFieldId) -> Self {
        Self {
            dataset: None,
            schema,
            field,
        }
    }

    pub fn with_dataset(mut self, dataset: DatasetId) -> Self {
        self.dataset = Some(dataset);
        self
    }
}

/// A non-empty chain of links.
///
/// Every link but the last names a `ref` field to follow; the last names the
/// field whose value is read. When the first link has no dataset, the chain
/// starts at whatever record the enclosing layer is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Link>", into = "Vec<Link>")]
pub struct Links(Vec<Link>);

impl Links {
    pub fn new(links: Vec<Link>) -> ModelResult<Self> {
        if links.is_empty() {
            return Err(ModelError::EmptyLinks);
        }
        Ok(Self(links))
    }

    pub fn single(link: Link) -> Self {
        Self(vec![link])
    }

    pub fn first(&self) -> &Link {
        &self.0[0]
    }

    pub fn last(&self) -> &Link {
        &self.0[self.0.len() - 1]
    }

    /// The links whose fields are followed as `ref` edges.
    pub fn hops(&self) -> &[Link] {
        &self.0[..self.0.len() - 1]
    }

    /// The dataset the chain starts from, if the first link names one.
    pub fn start_dataset(&self) -> Option<DatasetId> {
        self.first().dataset
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true: `Links` cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Link>> for Links {
    type Error = ModelError;

    fn try_from(links: Vec<Link>) -> ModelResult<Self> {
        Self::new(links)
    }
}

impl From<Links> for Vec<Link> {
    fn from(links: Links) -> Self {
        links.0
    }
}
