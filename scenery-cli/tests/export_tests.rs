use pretty_assertions::assert_eq;
use scenery_cli::{export, load_store, ExportOptions};
use scenery_model::{
    Layer, LayerCommon, LayerDocument, LayerGroup, LayerItem, Property, PropertyField, PropertyGroup, ValueType,
};
use scenery_store::StoreSnapshot;
use scenery_types::{LayerId, SceneId};
use std::io::Write;

struct Snapshot {
    file: tempfile::NamedTempFile,
    scene: SceneId,
    group: LayerId,
}

fn write_snapshot() -> Snapshot {
    let scene = SceneId::new();
    let color = PropertyField::new("color", ValueType::String).with_value("red");
    let property = Property::new(scene, "reearth/marker").with_item(PropertyGroup::new("default").with_field(color));
    let a = LayerItem::new(LayerCommon::new(scene).with_name("a"));
    let b = LayerItem::new(LayerCommon::new(scene).with_name("b"));
    let group = LayerGroup::new(
        LayerCommon::new(scene).with_name("group").with_property(property.id),
        vec![a.common.id, b.common.id],
    );
    let group_id = group.common.id;

    let snapshot = StoreSnapshot {
        layers: [Layer::from(group), Layer::from(a), Layer::from(b)]
            .into_iter()
            .map(LayerDocument::from)
            .collect(),
        properties: vec![property],
        ..StoreSnapshot::default()
    };
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(snapshot.to_json_pretty().unwrap().as_bytes()).unwrap();
    Snapshot {
        file,
        scene,
        group: group_id,
    }
}

// ── load_store ──────────────────────────────────────────────────

#[test]
fn loads_snapshot_file() {
    let snap = write_snapshot();
    let store = load_store(snap.file.path()).unwrap();
    assert_eq!(store.snapshot().layers.len(), 3);
}

#[test]
fn missing_snapshot_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_store(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read snapshot"));
}

// ── export ──────────────────────────────────────────────────────

#[test]
fn exports_tree() {
    let snap = write_snapshot();
    let store = load_store(snap.file.path()).unwrap();
    let json = export(&store, &ExportOptions::new(snap.group)).unwrap();

    assert_eq!(json["kind"], "group");
    assert_eq!(json["children"].as_array().unwrap().len(), 2);
    let color = &json["children"][1]["property"]["items"][0]["fields"][0];
    assert_eq!(color["field"], "color");
    assert_eq!(color["value"]["value"], "red");
}

#[test]
fn exports_flat_item_list() {
    let snap = write_snapshot();
    let store = load_store(snap.file.path()).unwrap();
    let options = ExportOptions {
        flatten: true,
        ..ExportOptions::new(snap.group)
    };
    let json = export(&store, &options).unwrap();

    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn scene_allow_list_hides_other_scenes() {
    let snap = write_snapshot();
    let store = load_store(snap.file.path()).unwrap();

    let mut options = ExportOptions::new(snap.group);
    options.scenes = vec![snap.scene];
    assert!(export(&store, &options).is_ok());

    options.scenes = vec![SceneId::new()];
    let err = export(&store, &options).unwrap_err();
    assert!(err.to_string().contains("Failed to resolve layer"));
}
