use pretty_assertions::assert_eq;
use scenery_model::{
    Link, Links, ModelError, Property, PropertyField, PropertyGroup, PropertyGroupList,
    PropertyItem, Value, ValueType,
};
use scenery_types::{DatasetFieldId, DatasetId, DatasetSchemaId, SceneId};

fn marker_property() -> Property {
    Property::new(SceneId::new(), "reearth/marker")
        .with_item(
            PropertyGroup::new("default")
                .with_field(PropertyField::new("color", ValueType::String).with_value("red"))
                .with_field(PropertyField::new("size", ValueType::Number).with_value(10.0)),
        )
        .with_item(
            PropertyGroupList::new("rows")
                .with_group(PropertyGroup::new("rows").with_field(PropertyField::new("title", ValueType::String)))
                .with_group(PropertyGroup::new("rows").with_field(PropertyField::new("title", ValueType::String))),
        )
}

// ── Lookup ───────────────────────────────────────────────────────

#[test]
fn field_lookup_by_schema_group() {
    let p = marker_property();
    let color = p.field("default", "color").unwrap();
    assert_eq!(color.value, Some(Value::String("red".into())));
    assert!(p.field("default", "missing").is_none());
    assert!(p.field("nope", "color").is_none());
}

#[test]
fn group_lookup_skips_group_lists() {
    let p = marker_property();
    assert!(p.group("rows").is_none());
    assert!(p.item("rows").unwrap().as_group_list().is_some());
}

#[test]
fn fields_iterates_groups_inside_lists() {
    let p = marker_property();
    let names: Vec<&str> = p.fields().map(|f| f.field.as_str()).collect();
    assert_eq!(names, vec!["color", "size", "title", "title"]);
}

#[test]
fn has_links_only_when_a_field_is_linked() {
    let p = marker_property();
    assert!(!p.has_links());

    let link = Link::new(DatasetSchemaId::new(), DatasetFieldId::new());
    let linked = Property::new(SceneId::new(), "reearth/marker").with_item(
        PropertyGroup::new("default").with_field(
            PropertyField::new("size", ValueType::Number).with_links(Links::single(link)),
        ),
    );
    assert!(linked.has_links());
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_accepts_well_formed_property() {
    assert!(marker_property().validate().is_ok());
}

#[test]
fn validate_rejects_duplicate_field() {
    let p = Property::new(SceneId::new(), "s").with_item(
        PropertyGroup::new("default")
            .with_field(PropertyField::new("color", ValueType::String))
            .with_field(PropertyField::new("color", ValueType::String)),
    );
    match p.validate() {
        Err(ModelError::DuplicateField { field, .. }) => assert_eq!(field, "color"),
        other => panic!("expected DuplicateField, got {:?}", other),
    }
}

#[test]
fn validate_rejects_duplicate_item_id() {
    let group = PropertyGroup::new("default");
    let p = Property::new(SceneId::new(), "s")
        .with_item(group.clone())
        .with_item(group);
    assert!(matches!(
        p.validate(),
        Err(ModelError::DuplicatePropertyItem { .. })
    ));
}

#[test]
fn validate_checks_ids_inside_group_lists() {
    let row = PropertyGroup::new("rows");
    let p = Property::new(SceneId::new(), "s")
        .with_item(PropertyGroupList::new("rows").with_group(row.clone()).with_group(row));
    assert!(matches!(
        p.validate(),
        Err(ModelError::DuplicatePropertyItem { .. })
    ));
}

// ── Links ────────────────────────────────────────────────────────

#[test]
fn links_reject_empty_chain() {
    assert_eq!(Links::new(vec![]), Err(ModelError::EmptyLinks));
}

#[test]
fn links_split_hops_from_terminal_field() {
    let schema = DatasetSchemaId::new();
    let (f1, f2, f3) = (DatasetFieldId::new(), DatasetFieldId::new(), DatasetFieldId::new());
    let start = DatasetId::new();
    let links = Links::new(vec![
        Link::new(schema, f1).with_dataset(start),
        Link::new(schema, f2),
        Link::new(schema, f3),
    ])
    .unwrap();

    assert_eq!(links.len(), 3);
    assert_eq!(links.start_dataset(), Some(start));
    let hops: Vec<DatasetFieldId> = links.hops().iter().map(|l| l.field).collect();
    assert_eq!(hops, vec![f1, f2]);
    assert_eq!(links.last().field, f3);
}

#[test]
fn single_link_has_no_hops() {
    let links = Links::single(Link::new(DatasetSchemaId::new(), DatasetFieldId::new()));
    assert!(links.hops().is_empty());
    assert_eq!(links.start_dataset(), None);
}

#[test]
fn links_deserialize_rejects_empty_array() {
    let json = r#"{"field":"size","type":"number","links":[]}"#;
    assert!(serde_json::from_str::<PropertyField>(json).is_err());
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn property_json_roundtrip() {
    let p = marker_property();
    let json = serde_json::to_string(&p).unwrap();
    let back: Property = serde_json::from_str(&json).unwrap();
    assert_eq!(p, back);
}

#[test]
fn property_item_is_tagged_by_type() {
    let item: PropertyItem = PropertyGroup::new("default").into();
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["type"], "group");
}
