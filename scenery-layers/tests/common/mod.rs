//! Shared fixtures for layer engine tests.

#![allow(dead_code)]

use scenery_model::{
    Dataset, DatasetField, Layer, LayerCommon, LayerGroup, LayerItem, Link, Links, Property, PropertyField,
    PropertyGroup, Value, ValueType,
};
use scenery_store::MemoryStore;
use scenery_types::{DatasetFieldId, DatasetSchemaId, LayerId, PropertyId, SceneId};

pub const SCHEMA: &str = "reearth/marker";
pub const GROUP: &str = "default";

/// A field holding a literal value.
pub fn field(name: &str, value: impl Into<Value>) -> PropertyField {
    let value = value.into();
    PropertyField::new(name, value.value_type()).with_value(value)
}

/// A field with a type and nothing else.
pub fn unset(name: &str, value_type: ValueType) -> PropertyField {
    PropertyField::new(name, value_type)
}

/// A field whose value comes from `links`, falling back to `fallback`.
pub fn linked(name: &str, fallback: impl Into<Value>, links: Links) -> PropertyField {
    field(name, fallback).with_links(links)
}

/// A one-hop link reading `field` from whatever record the layer is bound to.
pub fn link(schema: DatasetSchemaId, field: DatasetFieldId) -> Links {
    Links::single(Link::new(schema, field))
}

/// A property with one `default` group holding `fields`.
pub fn property(scene: SceneId, fields: Vec<PropertyField>) -> Property {
    let group = fields
        .into_iter()
        .fold(PropertyGroup::new(GROUP), PropertyGroup::with_field);
    Property::new(scene, SCHEMA).with_item(group)
}

/// An in-memory scene that tests fill with layers, properties and records.
pub struct Fixture {
    pub scene: SceneId,
    pub store: MemoryStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            scene: SceneId::new(),
            store: MemoryStore::new(),
        }
    }

    pub fn property(&mut self, fields: Vec<PropertyField>) -> PropertyId {
        let property = property(self.scene, fields);
        let id = property.id;
        self.store.insert_property(property);
        id
    }

    pub fn common(&self, name: &str) -> LayerCommon {
        LayerCommon::new(self.scene).with_name(name)
    }

    pub fn insert(&mut self, layer: impl Into<Layer>) -> LayerId {
        let layer = layer.into();
        let id = layer.id();
        self.store.insert_layer(layer);
        id
    }

    /// Stores an item with the given property.
    pub fn item(&mut self, name: &str, property: Option<PropertyId>) -> LayerId {
        let mut common = self.common(name);
        common.property = property;
        self.insert(LayerItem::new(common))
    }

    /// Stores a group with the given property and children.
    pub fn group(&mut self, name: &str, property: Option<PropertyId>, children: Vec<LayerId>) -> LayerId {
        let mut common = self.common(name);
        common.property = property;
        self.insert(LayerGroup::new(common, children))
    }

    pub fn record(&mut self, schema: DatasetSchemaId, fields: Vec<DatasetField>) -> Dataset {
        let record = fields
            .into_iter()
            .fold(Dataset::new(self.scene, schema), Dataset::with_field);
        self.store.insert_dataset(record.clone());
        record
    }
}
