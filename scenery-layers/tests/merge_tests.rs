mod common;

use common::{field, link, linked, property, unset, Fixture, GROUP, SCHEMA};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scenery_layers::{merge_property, Engine, EngineConfig, EngineError, MergedItem, MergedLayer, MergedMetadata};
use scenery_model::{
    DatasetField, Infobox, InfoboxField, InvalidLayerError, ItemSection, GroupSection, LayerDocument, LayerGroup, LayerItem,
    Property, PropertyGroup, PropertyGroupList, Value, ValueType,
};
use scenery_store::Context;
use scenery_types::{DatasetFieldId, DatasetId, DatasetSchemaId, LayerId, PropertyId, SceneId};

fn values(merged: &scenery_layers::MergedProperty) -> Vec<(String, Option<Value>)> {
    merged.fields().map(|f| (f.field.clone(), f.value.clone())).collect()
}

// ── merge_property ──────────────────────────────────────────────

#[test]
fn own_property_alone_is_unchanged() {
    let scene = SceneId::new();
    let own = property(scene, vec![field("color", "blue"), field("size", 3.0), unset("label", ValueType::String)]);
    let plan = MergedMetadata::new(Some(own.id), None, None);
    let merged = plan.merge(std::slice::from_ref(&own));

    assert_eq!(merged.original, Some(own.id));
    assert_eq!(merged.parent, None);
    assert_eq!(merged.schema.as_deref(), Some(SCHEMA));
    assert_eq!(
        values(&merged),
        vec![
            ("color".to_string(), Some(Value::from("blue"))),
            ("size".to_string(), Some(Value::from(3.0))),
            ("label".to_string(), None),
        ]
    );
    assert!(merged.fields().all(|f| !f.overridden));
}

#[test]
fn own_value_wins_over_parent() {
    let scene = SceneId::new();
    let own = property(scene, vec![field("color", "blue")]);
    let parent = property(scene, vec![field("color", "red")]);
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    let color = merged.field(GROUP, "color").unwrap();
    assert_eq!(color.value, Some(Value::from("blue")));
    assert!(color.overridden);
}

#[test]
fn unset_own_value_inherits_parent() {
    let scene = SceneId::new();
    let own = property(scene, vec![unset("color", ValueType::String)]);
    let parent = property(scene, vec![field("color", "red")]);
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    let color = merged.field(GROUP, "color").unwrap();
    assert_eq!(color.value, Some(Value::from("red")));
    assert!(!color.overridden);
}

#[test]
fn fields_from_either_side_are_all_enumerated() {
    let scene = SceneId::new();
    let own = property(scene, vec![field("a", 1.0), unset("c", ValueType::Bool)]);
    let parent = property(scene, vec![field("b", 2.0)]);
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    assert_eq!(
        values(&merged),
        vec![
            ("a".to_string(), Some(Value::from(1.0))),
            ("c".to_string(), None),
            ("b".to_string(), Some(Value::from(2.0))),
        ]
    );
}

#[test]
fn groups_only_on_parent_are_inherited() {
    let scene = SceneId::new();
    let own = property(scene, vec![field("a", 1.0)]);
    let parent = Property::new(scene, SCHEMA)
        .with_item(PropertyGroup::new("appearance").with_field(field("opacity", 0.5)));
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    assert_eq!(merged.items.len(), 2);
    let opacity = merged.field("appearance", "opacity").unwrap();
    assert_eq!(opacity.value, Some(Value::from(0.5)));
}

#[test]
fn own_links_win_over_parent_links() {
    let scene = SceneId::new();
    let schema = DatasetSchemaId::new();
    let (mine, theirs) = (DatasetFieldId::new(), DatasetFieldId::new());
    let own = property(scene, vec![linked("size", 1.0, link(schema, mine))]);
    let parent = property(scene, vec![linked("size", 2.0, link(schema, theirs))]);
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    let size = merged.field(GROUP, "size").unwrap();
    assert_eq!(size.links.as_ref().unwrap().last().field, mine);
}

#[test]
fn parent_links_are_inherited_when_own_has_none() {
    let scene = SceneId::new();
    let schema = DatasetSchemaId::new();
    let theirs = DatasetFieldId::new();
    let own = property(scene, vec![field("size", 1.0)]);
    let parent = property(scene, vec![linked("size", 2.0, link(schema, theirs))]);
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    let size = merged.field(GROUP, "size").unwrap();
    assert_eq!(size.value, Some(Value::from(1.0)));
    assert_eq!(size.links.as_ref().unwrap().last().field, theirs);
}

#[test]
fn group_list_is_taken_whole_from_original() {
    let scene = SceneId::new();
    let list = |n: usize| {
        (0..n).fold(PropertyGroupList::new("rows"), |list, i| {
            list.with_group(PropertyGroup::new("rows").with_field(field("n", i as f64)))
        })
    };
    let own = Property::new(scene, SCHEMA).with_item(list(2));
    let parent = Property::new(scene, SCHEMA).with_item(list(3));
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));
    let MergedItem::GroupList(rows) = &merged.items[0] else {
        panic!("expected a group list");
    };
    assert_eq!(rows.groups.len(), 2);

    let empty = Property::new(scene, SCHEMA).with_item(list(0));
    let merged = merge_property(&MergedMetadata::default(), Some(&empty), Some(&parent));
    let MergedItem::GroupList(rows) = &merged.items[0] else {
        panic!("expected a group list");
    };
    assert_eq!(rows.groups.len(), 3);
}

#[test]
fn group_list_only_on_parent_is_inherited() {
    let scene = SceneId::new();
    let rows = PropertyGroupList::new("rows")
        .with_group(PropertyGroup::new("rows").with_field(field("n", 1.0)))
        .with_group(PropertyGroup::new("rows").with_field(field("n", 2.0)));
    let rows_id = rows.id;
    let own = property(scene, vec![field("color", "blue")]);
    let parent = Property::new(scene, SCHEMA).with_item(rows);
    let merged = merge_property(&MergedMetadata::default(), Some(&own), Some(&parent));

    assert_eq!(merged.items.len(), 2);
    let MergedItem::GroupList(rows) = &merged.items[1] else {
        panic!("expected a group list");
    };
    assert_eq!(rows.original, None);
    assert_eq!(rows.parent, Some(rows_id));
    assert!(rows.groups.iter().all(|g| g.original.is_none()));
    assert_eq!(
        values(&merged)[1..].to_vec(),
        vec![
            ("n".to_string(), Some(Value::from(1.0))),
            ("n".to_string(), Some(Value::from(2.0))),
        ]
    );
}

#[test]
fn neither_side_gives_empty_property() {
    let merged = merge_property(&MergedMetadata::default(), None, None);
    assert!(merged.is_empty());
    assert_eq!(merged.schema, None);
}

#[test]
fn unloaded_ids_count_as_absent() {
    let scene = SceneId::new();
    let parent = property(scene, vec![field("color", "red")]);
    let plan = MergedMetadata::new(Some(PropertyId::new()), Some(parent.id), None);
    let unrelated = property(scene, vec![field("color", "green")]);
    let merged = plan.merge(&[unrelated, parent.clone()]);

    assert_eq!(merged.original, None);
    assert_eq!(merged.parent, Some(parent.id));
    assert_eq!(merged.field(GROUP, "color").unwrap().value, Some(Value::from("red")));
}

// ── Merge stage ─────────────────────────────────────────────────

#[test]
fn parentless_item_keeps_own_property() {
    let mut fx = Fixture::new();
    let p = fx.property(vec![field("color", "blue")]);
    let item = fx.item("marker", Some(p));

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), item).unwrap();
    let property = merged.property();
    assert_eq!(property.original, Some(p));
    assert_eq!(property.parent, None);
    assert_eq!(values(property), vec![("color".to_string(), Some(Value::from("blue")))]);
}

#[test]
fn children_inherit_parent_group_property() {
    let mut fx = Fixture::new();
    let gp = fx.property(vec![field("color", "red"), field("size", 1.0)]);
    let ip = fx.property(vec![field("size", 5.0)]);
    let child = fx.item("child", Some(ip));
    let bare = fx.item("bare", None);
    let group = fx.group("group", Some(gp), vec![child, bare]);

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), group).unwrap();
    let children = &merged.as_group().unwrap().children;
    assert_eq!(children.len(), 2);

    let child = children[0].property();
    assert_eq!(child.field(GROUP, "color").unwrap().value, Some(Value::from("red")));
    assert_eq!(child.field(GROUP, "size").unwrap().value, Some(Value::from(5.0)));

    let bare = children[1].property();
    assert_eq!(bare.original, None);
    assert_eq!(bare.parent, Some(gp));
    assert_eq!(bare.field(GROUP, "size").unwrap().value, Some(Value::from(1.0)));
}

#[test]
fn one_property_batch_per_node() {
    let mut fx = Fixture::new();
    let gp = fx.property(vec![field("color", "red")]);
    let a = fx.property(vec![field("size", 1.0)]);
    let b = fx.property(vec![field("size", 2.0)]);
    let ia = fx.item("a", Some(a));
    let ib = fx.item("b", Some(b));
    let group = fx.group("group", Some(gp), vec![ia, ib]);

    Engine::from_store(&fx.store).merge(&Context::new(), group).unwrap();
    let stats = fx.store.stats();
    assert_eq!(stats.property_batches, 3);
    assert_eq!(stats.layer_batches, 2);
}

#[test]
fn missing_root_is_layer_not_found() {
    let fx = Fixture::new();
    let missing = LayerId::new();
    let err = Engine::from_store(&fx.store).merge(&Context::new(), missing).unwrap_err();
    assert!(matches!(err, EngineError::LayerNotFound(id) if id == missing));
}

#[test]
fn unreadable_root_is_layer_not_found() {
    let mut fx = Fixture::new();
    let item = fx.item("hidden", None);
    let ctx = Context::new().with_readable_scenes([SceneId::new()]);
    let err = Engine::from_store(&fx.store).merge(&ctx, item).unwrap_err();
    assert!(matches!(err, EngineError::LayerNotFound(_)));
}

fn malformed(fx: &Fixture, item: bool, group: bool) -> LayerDocument {
    LayerDocument {
        common: fx.common("malformed"),
        item: item.then(ItemSection::default),
        group: group.then(GroupSection::default),
    }
}

#[test]
fn malformed_root_is_invalid_layer() {
    let mut fx = Fixture::new();
    let both = malformed(&fx, true, true);
    let neither = malformed(&fx, false, false);
    let (both_id, neither_id) = (both.id(), neither.id());
    fx.store.insert_layer(both);
    fx.store.insert_layer(neither);
    let engine = Engine::from_store(&fx.store);

    let err = engine.merge(&Context::new(), both_id).unwrap_err();
    assert!(matches!(err, EngineError::InvalidLayer(InvalidLayerError::Ambiguous { id }) if id == both_id));
    let err = engine.merge(&Context::new(), neither_id).unwrap_err();
    assert!(matches!(err, EngineError::InvalidLayer(InvalidLayerError::MissingKind { .. })));
}

#[test]
fn malformed_and_missing_children_are_skipped() {
    let mut fx = Fixture::new();
    let good = fx.item("good", None);
    let bad = malformed(&fx, true, true);
    let bad_id = bad.id();
    fx.store.insert_layer(bad);
    let group = fx.group("group", None, vec![bad_id, LayerId::new(), good]);

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), group).unwrap();
    let ids: Vec<LayerId> = merged.as_group().unwrap().children.iter().map(MergedLayer::id).collect();
    assert_eq!(ids, vec![good]);
}

#[test]
fn group_listing_itself_is_skipped() {
    let mut fx = Fixture::new();
    let leaf = fx.item("leaf", None);
    let common = fx.common("loop");
    let id = common.id;
    fx.insert(LayerGroup::new(common, vec![id, leaf]));

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), id).unwrap();
    let ids: Vec<LayerId> = merged.walk().into_iter().map(MergedLayer::id).collect();
    assert_eq!(ids, vec![id, leaf]);
}

#[test]
fn two_group_cycle_is_cut_at_the_repeat() {
    let mut fx = Fixture::new();
    let a_common = fx.common("a");
    let a = a_common.id;
    let b = fx.group("b", None, vec![a]);
    fx.insert(LayerGroup::new(a_common, vec![b]));
    let engine = Engine::from_store(&fx.store);

    let from_a = engine.merge(&Context::new(), a).unwrap();
    let ids: Vec<LayerId> = from_a.walk().into_iter().map(MergedLayer::id).collect();
    assert_eq!(ids, vec![a, b]);

    let from_b = engine.resolve(&Context::new(), b).unwrap();
    assert_eq!(from_b.walk().into_iter().map(|n| n.id()).collect::<Vec<_>>(), vec![b, a]);
}

#[test]
fn dangling_property_is_absent() {
    let mut fx = Fixture::new();
    let item = fx.item("orphan", Some(PropertyId::new()));
    let merged = Engine::from_store(&fx.store).merge(&Context::new(), item).unwrap();
    assert!(merged.property().is_empty());
    assert_eq!(merged.property().original, None);
}

#[test]
fn nested_groups_inherit_from_nearest_group_only() {
    let mut fx = Fixture::new();
    let outer_p = fx.property(vec![field("color", "red")]);
    let inner_p = fx.property(vec![field("size", 2.0)]);
    let leaf = fx.item("leaf", None);
    let inner = fx.group("inner", Some(inner_p), vec![leaf]);
    let outer = fx.group("outer", Some(outer_p), vec![inner]);

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), outer).unwrap();
    let walk = merged.walk();
    assert_eq!(walk.len(), 3);
    let leaf = walk[2].property();
    assert_eq!(leaf.parent, Some(inner_p));
    assert!(leaf.field(GROUP, "color").is_none());
}

// ── Infobox ─────────────────────────────────────────────────────

#[test]
fn infobox_property_inherits_from_parent_infobox() {
    let mut fx = Fixture::new();
    let group_box = fx.property(vec![field("title", "Default"), field("size", "small")]);
    let own_box = fx.property(vec![unset("title", ValueType::String), field("size", "large")]);
    let row = fx.property(vec![field("text", "hello")]);

    let mut child_common = fx.common("child");
    child_common.infobox = Some(Infobox::new(own_box).with_field(InfoboxField::new("plugin", "textblock", row)));
    let child = fx.insert(LayerItem::new(child_common));
    let mut group_common = fx.common("group");
    group_common.infobox = Some(Infobox::new(group_box));
    let group = fx.insert(LayerGroup::new(group_common, vec![child]));

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), group).unwrap();
    let child = &merged.as_group().unwrap().children[0];
    let infobox = child.common().infobox.as_ref().unwrap();
    assert_eq!(infobox.property.field(GROUP, "title").unwrap().value, Some(Value::from("Default")));
    assert_eq!(infobox.property.field(GROUP, "size").unwrap().value, Some(Value::from("large")));
    assert_eq!(infobox.fields.len(), 1);
    assert_eq!(infobox.fields[0].extension_id, "textblock");
    assert_eq!(
        infobox.fields[0].property.field(GROUP, "text").unwrap().value,
        Some(Value::from("hello"))
    );
}

#[test]
fn child_without_infobox_shows_parent_infobox() {
    let mut fx = Fixture::new();
    let group_box = fx.property(vec![field("title", "Default")]);
    let row = fx.property(vec![field("text", "shared")]);
    let child = fx.item("child", None);
    let mut group_common = fx.common("group");
    group_common.infobox = Some(Infobox::new(group_box).with_field(InfoboxField::new("plugin", "textblock", row)));
    let group = fx.insert(LayerGroup::new(group_common, vec![child]));

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), group).unwrap();
    let infobox = merged.as_group().unwrap().children[0].common().infobox.clone().unwrap();
    assert_eq!(infobox.property.original, None);
    assert_eq!(infobox.property.parent, Some(group_box));
    assert_eq!(infobox.fields[0].property.parent, Some(row));
    // Own and infobox properties come from one batch.
    assert_eq!(fx.store.stats().property_batches, 2);
}

#[test]
fn empty_own_infobox_shows_parent_fields() {
    let mut fx = Fixture::new();
    let group_box = fx.property(vec![field("title", "Default")]);
    let own_box = fx.property(vec![field("title", "Mine")]);
    let row = fx.property(vec![field("text", "shared")]);

    let mut child_common = fx.common("child");
    child_common.infobox = Some(Infobox::new(own_box));
    let child = fx.insert(LayerItem::new(child_common));
    let mut group_common = fx.common("group");
    group_common.infobox = Some(Infobox::new(group_box).with_field(InfoboxField::new("plugin", "textblock", row)));
    let group = fx.insert(LayerGroup::new(group_common, vec![child]));

    let merged = Engine::from_store(&fx.store).merge(&Context::new(), group).unwrap();
    let infobox = merged.as_group().unwrap().children[0].common().infobox.clone().unwrap();
    assert_eq!(infobox.property.original, Some(own_box));
    assert_eq!(infobox.property.parent, Some(group_box));
    assert_eq!(infobox.property.field(GROUP, "title").unwrap().value, Some(Value::from("Mine")));
    assert_eq!(infobox.fields.len(), 1);
    assert_eq!(infobox.fields[0].property.original, None);
    assert_eq!(infobox.fields[0].property.parent, Some(row));
    assert_eq!(
        infobox.fields[0].property.field(GROUP, "text").unwrap().value,
        Some(Value::from("shared"))
    );
}

// ── Linked groups ───────────────────────────────────────────────

struct LinkedGroup {
    fx: Fixture,
    group: LayerId,
    property: PropertyId,
    bound_child: LayerId,
    records: Vec<DatasetId>,
}

fn linked_group() -> LinkedGroup {
    let mut fx = Fixture::new();
    let schema = DatasetSchemaId::new();
    let size = DatasetFieldId::new();
    let records: Vec<_> = (1..=3)
        .map(|n| fx.record(schema, vec![DatasetField::new(size, n as f64)]).id)
        .collect();
    let gp = fx.property(vec![linked("size", 0.0, link(schema, size))]);
    let first = LayerItem::new(fx.common("first")).bound_to(records[0]);
    let bound_child = fx.insert(first);
    let mut common = fx.common("cities");
    common.property = Some(gp);
    let group = fx.insert(LayerGroup::new(common, vec![bound_child]).linked_to_schema(schema));
    LinkedGroup {
        fx,
        group,
        property: gp,
        bound_child,
        records,
    }
}

#[test]
fn linked_group_spawns_one_child_per_unbound_record() {
    let lg = linked_group();
    let merged = Engine::from_store(&lg.fx.store).merge(&Context::new(), lg.group).unwrap();
    let children = &merged.as_group().unwrap().children;
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].id(), lg.bound_child);
    assert!(!children[0].as_item().unwrap().spawned);

    let mut bound: Vec<_> = children
        .iter()
        .map(|c| c.as_item().unwrap().linked_dataset.unwrap())
        .collect();
    bound.sort();
    let mut expected = lg.records.clone();
    expected.sort();
    assert_eq!(bound, expected);

    for child in &children[1..] {
        let item = child.as_item().unwrap();
        assert!(item.spawned);
        assert_eq!(item.common.property.parent, Some(lg.property));
        assert_eq!(item.common.property.linked_dataset, item.linked_dataset);
    }
}

#[test]
fn spawned_child_ids_are_stable() {
    let lg = linked_group();
    let engine = Engine::from_store(&lg.fx.store);
    let first = engine.merge(&Context::new(), lg.group).unwrap();
    let second = engine.merge(&Context::new(), lg.group).unwrap();
    let ids = |m: &MergedLayer| m.walk().iter().map(|l| l.id()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));

    let spawned = first.as_group().unwrap().children[1].as_item().unwrap();
    let record = spawned.linked_dataset.unwrap();
    assert_eq!(
        spawned.common.id,
        LayerId::derive(lg.group.as_uuid(), record.as_uuid().as_bytes())
    );
}

#[test]
fn spawning_can_be_disabled() {
    let lg = linked_group();
    let config = EngineConfig {
        spawn_linked_children: false,
        ..EngineConfig::default()
    };
    let merged = Engine::from_store(&lg.fx.store)
        .with_config(config)
        .merge(&Context::new(), lg.group)
        .unwrap();
    assert_eq!(merged.as_group().unwrap().children.len(), 1);
    assert_eq!(lg.fx.store.stats().schema_scans, 0);
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn own_then_parent_then_unset(
        own in proptest::option::of(-1e6f64..1e6),
        inherited in proptest::option::of(-1e6f64..1e6),
    ) {
        let scene = SceneId::new();
        let make = |v: Option<f64>| {
            let f = match v {
                Some(n) => field("size", n),
                None => unset("size", ValueType::Number),
            };
            property(scene, vec![f])
        };
        let (own_p, parent_p) = (make(own), make(inherited));
        let plan = MergedMetadata::new(Some(own_p.id), Some(parent_p.id), None);
        let merged = plan.merge(&[parent_p, own_p]);

        let size = merged.field(GROUP, "size").unwrap();
        prop_assert_eq!(size.value.clone(), own.or(inherited).map(Value::from));
        prop_assert_eq!(size.overridden, own.is_some() && inherited.is_some());
    }
}
