//! Merge stage: builds the merged tree for a layer and its descendants.
//!
//! Each node loads every property it needs (own, inherited, infobox) in a
//! single batch; each group loads all of its children in a single batch.
//! Children are merged before their parent node is assembled.

use crate::merged::{
    MergedInfobox, MergedInfoboxField, MergedLayer, MergedLayerCommon, MergedLayerGroup, MergedLayerItem,
    MergedMetadata,
};
use crate::{EngineConfig, EngineError, EngineResult};
use scenery_model::{Infobox, InfoboxField, Layer, LayerCommon, LayerGroup, LayerItem, Property};
use scenery_store::{Context, DatasetLoader, LayerLoader, PropertyLoader};
use scenery_types::{DatasetId, DatasetSchemaId, LayerId, PropertyId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Runs the merge stage for one request.
pub struct Merger<'a> {
    ctx: &'a Context,
    layers: &'a dyn LayerLoader,
    properties: &'a dyn PropertyLoader,
    datasets: &'a dyn DatasetLoader,
    config: &'a EngineConfig,
}

impl<'a> Merger<'a> {
    pub fn new(
        ctx: &'a Context,
        layers: &'a dyn LayerLoader,
        properties: &'a dyn PropertyLoader,
        datasets: &'a dyn DatasetLoader,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            ctx,
            layers,
            properties,
            datasets,
            config,
        }
    }

    /// Loads the layer `id` and merges it with no parent.
    ///
    /// A missing or unreadable root is [`EngineError::LayerNotFound`]; a
    /// malformed one is [`EngineError::InvalidLayer`].
    pub fn merge_root(&self, id: LayerId) -> EngineResult<MergedLayer> {
        self.ctx.check()?;
        let doc = self
            .layers
            .load_layers(self.ctx, &[id])?
            .into_iter()
            .next()
            .flatten()
            .ok_or(EngineError::LayerNotFound(id))?;
        let layer = Layer::try_from(doc)?;
        if !self.ctx.can_read(layer.scene()) {
            return Err(EngineError::LayerNotFound(id));
        }
        self.merge_layer(&layer, None)
    }

    /// Merges `layer`, inheriting from `parent` when given, and recursively
    /// merges its children.
    pub fn merge_layer(&self, layer: &Layer, parent: Option<&LayerGroup>) -> EngineResult<MergedLayer> {
        let mut ancestors = parent.map(|p| vec![p.common.id]).unwrap_or_default();
        self.merge_node(layer, parent, &mut ancestors)
    }

    /// `ancestors` holds the ids of the groups above `layer`.
    fn merge_node(
        &self,
        layer: &Layer,
        parent: Option<&LayerGroup>,
        ancestors: &mut Vec<LayerId>,
    ) -> EngineResult<MergedLayer> {
        match layer {
            Layer::Item(item) => self.merge_item(item, parent, false).map(MergedLayer::Item),
            Layer::Group(group) => self.merge_group(group, parent, ancestors).map(MergedLayer::Group),
        }
    }

    fn merge_item(&self, item: &LayerItem, parent: Option<&LayerGroup>, spawned: bool) -> EngineResult<MergedLayerItem> {
        Ok(MergedLayerItem {
            common: self.merge_common(&item.common, parent, item.linked_dataset)?,
            linked_dataset: item.linked_dataset,
            spawned,
        })
    }

    fn merge_group(
        &self,
        group: &LayerGroup,
        parent: Option<&LayerGroup>,
        ancestors: &mut Vec<LayerId>,
    ) -> EngineResult<MergedLayerGroup> {
        let common = self.merge_common(&group.common, parent, None)?;
        ancestors.push(group.common.id);
        let children = self.merge_children(group, ancestors);
        ancestors.pop();
        let mut children = children?;
        if let Some(schema) = group.linked_dataset_schema {
            if self.config.spawn_linked_children {
                let spawned = self.spawn_linked_children(group, schema, &children)?;
                children.extend(spawned);
            }
        }
        Ok(MergedLayerGroup {
            common,
            linked_dataset_schema: group.linked_dataset_schema,
            root: group.root,
            children,
        })
    }

    fn merge_common(
        &self,
        common: &LayerCommon,
        parent: Option<&LayerGroup>,
        linked_dataset: Option<DatasetId>,
    ) -> EngineResult<MergedLayerCommon> {
        let inherited = parent.map(|p| &p.common);
        let property_plan = MergedMetadata::new(common.property, inherited.and_then(|p| p.property), linked_dataset);
        let infobox_plan = InfoboxPlan::new(
            common.infobox.as_ref(),
            inherited.and_then(|p| p.infobox.as_ref()),
            linked_dataset,
        );

        let mut seen = HashSet::new();
        let ids: Vec<PropertyId> = property_plan
            .property_ids()
            .chain(infobox_plan.iter().flat_map(|plan| plan.property_ids()))
            .filter(|id| seen.insert(*id))
            .collect();
        let loaded = self.load_properties(&ids)?;

        Ok(MergedLayerCommon {
            id: common.id,
            scene: common.scene,
            name: common.name.clone(),
            visible: common.visible,
            plugin_id: common.plugin_id.clone(),
            extension_id: common.extension_id.clone(),
            property: property_plan.merge(&loaded),
            infobox: infobox_plan.map(|plan| plan.merge(&loaded)),
            tags: common.tags.clone(),
        })
    }

    fn load_properties(&self, ids: &[PropertyId]) -> EngineResult<Vec<Property>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ctx.check()?;
        let loaded = self.properties.load_properties(self.ctx, ids)?;
        if loaded.len() < ids.len() {
            debug!("Loaded {} of {} properties; missing ones are treated as absent", loaded.len(), ids.len());
        }
        Ok(loaded)
    }

    fn merge_children(&self, group: &LayerGroup, ancestors: &mut Vec<LayerId>) -> EngineResult<Vec<MergedLayer>> {
        if group.layers.is_empty() {
            return Ok(Vec::new());
        }
        self.ctx.check()?;
        let docs = self.layers.load_layers(self.ctx, &group.layers)?;

        let mut children = Vec::with_capacity(docs.len());
        for (id, doc) in group.layers.iter().zip(docs) {
            if ancestors.contains(id) {
                warn!("Skipping child {} of group {}: cycle", id, group.common.id);
                continue;
            }
            let Some(doc) = doc else {
                debug!("Child layer {} of group {} not found, skipping", id, group.common.id);
                continue;
            };
            let layer = match Layer::try_from(doc) {
                Ok(layer) => layer,
                Err(e) => {
                    warn!("Skipping child of group {}: {}", group.common.id, e);
                    continue;
                }
            };
            children.push(self.merge_node(&layer, Some(group), ancestors)?);
        }
        Ok(children)
    }

    /// One item per record of `schema` that no stored child is bound to.
    fn spawn_linked_children(
        &self,
        group: &LayerGroup,
        schema: DatasetSchemaId,
        existing: &[MergedLayer],
    ) -> EngineResult<Vec<MergedLayer>> {
        self.ctx.check()?;
        let records = self.datasets.load_datasets_by_schema(self.ctx, schema)?;
        let bound: HashSet<DatasetId> = existing
            .iter()
            .filter_map(|child| child.as_item()?.linked_dataset)
            .collect();

        let mut spawned = Vec::new();
        for record in records.iter().filter(|r| !bound.contains(&r.id)) {
            let item = linked_child(group, record.id);
            spawned.push(MergedLayer::Item(self.merge_item(&item, Some(group), true)?));
        }
        debug!(
            "Spawned {} linked children for group {} ({} records)",
            spawned.len(),
            group.common.id,
            records.len()
        );
        Ok(spawned)
    }
}

/// The item a linked group shows for `record`. Its id is stable across
/// requests for the same group and record.
fn linked_child(group: &LayerGroup, record: DatasetId) -> LayerItem {
    let mut common = LayerCommon::new(group.common.scene);
    common.id = LayerId::derive(group.common.id.as_uuid(), record.as_uuid().as_bytes());
    common.name = group.common.name.clone();
    common.visible = group.common.visible;
    common.plugin_id = group.common.plugin_id.clone();
    common.extension_id = group.common.extension_id.clone();
    LayerItem::new(common).bound_to(record)
}

/// Merge plans for an infobox and its fields.
struct InfoboxPlan<'l> {
    property: MergedMetadata,
    fields: Vec<(&'l InfoboxField, MergedMetadata)>,
}

impl<'l> InfoboxPlan<'l> {
    /// The infobox property merges own over inherited. Fields come from the
    /// node's own infobox, or from the parent's when the node has none or
    /// its own has no fields.
    fn new(own: Option<&'l Infobox>, inherited: Option<&'l Infobox>, linked: Option<DatasetId>) -> Option<Self> {
        let property = MergedMetadata::new(own.map(|i| i.property), inherited.map(|i| i.property), linked);
        let fields = match (own, inherited) {
            (Some(own), _) if !own.fields.is_empty() => own
                .fields
                .iter()
                .map(|f| (f, MergedMetadata::new(Some(f.property), None, linked)))
                .collect(),
            (_, Some(inherited)) => inherited
                .fields
                .iter()
                .map(|f| (f, MergedMetadata::new(None, Some(f.property), linked)))
                .collect(),
            (Some(_), None) => Vec::new(),
            (None, None) => return None,
        };
        Some(Self { property, fields })
    }

    fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.property
            .property_ids()
            .chain(self.fields.iter().flat_map(|(_, plan)| plan.property_ids()))
    }

    fn merge(&self, loaded: &[Property]) -> MergedInfobox {
        MergedInfobox {
            property: self.property.merge(loaded),
            fields: self
                .fields
                .iter()
                .map(|(field, plan)| MergedInfoboxField {
                    id: field.id,
                    plugin_id: field.plugin_id.clone(),
                    extension_id: field.extension_id.clone(),
                    property: plan.merge(loaded),
                })
                .collect(),
        }
    }
}
