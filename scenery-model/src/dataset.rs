use crate::{Value, ValueType};
use scenery_types::{DatasetFieldId, DatasetId, DatasetSchemaId, SceneId};
use serde::{Deserialize, Serialize};

/// A record in the external dataset store.
///
/// Fields of type [`ValueType::Ref`] hold the id of another record, which
/// makes the store a directed graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub scene: SceneId,
    pub schema: DatasetSchemaId,
    /// Where the record was imported from (file name, URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub fields: Vec<DatasetField>,
}

impl Dataset {
    pub fn new(scene: SceneId, schema: DatasetSchemaId) -> Self {
        Self {
            id: DatasetId::new(),
            scene,
            schema,
            source: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: DatasetField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, id: DatasetFieldId) -> Option<&DatasetField> {
        self.fields.iter().find(|f| f.field == id)
    }

    /// Follows the `ref` field `id`, if it exists and holds a valid record id.
    pub fn ref_target(&self, id: DatasetFieldId) -> Option<DatasetId> {
        self.field(id).and_then(DatasetField::ref_target)
    }

    /// Every outgoing edge of this record, in field order.
    pub fn ref_targets(&self) -> impl Iterator<Item = (DatasetFieldId, DatasetId)> + '_ {
        self.fields
            .iter()
            .filter_map(|f| f.ref_target().map(|target| (f.field, target)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetField {
    pub field: DatasetFieldId,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DatasetField {
    /// A field whose type is taken from its value.
    pub fn new(field: DatasetFieldId, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            field,
            value_type: value.value_type(),
            value: Some(value),
            source: None,
        }
    }

    /// A `ref` field pointing at another record.
    pub fn reference(field: DatasetFieldId, target: DatasetId) -> Self {
        Self {
            field,
            value_type: ValueType::Ref,
            value: Some(Value::Ref(target.to_string())),
            source: None,
        }
    }

    pub fn is_ref(&self) -> bool {
        self.value_type == ValueType::Ref
    }

    /// The record this field points at. `None` unless the field is typed
    /// `ref` and its value parses as a dataset id.
    pub fn ref_target(&self) -> Option<DatasetId> {
        if !self.is_ref() {
            return None;
        }
        match &self.value {
            Some(Value::Ref(s)) => DatasetId::parse(s).ok(),
            _ => None,
        }
    }
}
