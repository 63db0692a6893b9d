//! Seal stage: turns a merged tree into a sealed one.
//!
//! Tags for the whole tree are loaded in one batch up front. Dataset links
//! are followed through a [`DatasetPathResolver`]; a link that cannot be
//! followed leaves the field at its literal value and records why.

use crate::merged::{MergedField, MergedGroup, MergedInfobox, MergedItem, MergedLayer, MergedLayerCommon, MergedProperty};
use crate::sealed::{
    LinkFailure, SealedField, SealedGroup, SealedGroupList, SealedInfobox, SealedInfoboxField, SealedItem,
    SealedLayer, SealedLayerCommon, SealedLayerGroup, SealedLayerItem, SealedProperty, SealedTag, ValueSource,
};
use crate::{EngineError, EngineResult};
use scenery_datasets::{DatasetPathResolver, WalkError};
use scenery_model::{LayerTag, LayerTagList, Links, Tag, Value, ValueType};
use scenery_store::{Context, TagLoader};
use scenery_types::{DatasetFieldId, DatasetId, TagId};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Runs the seal stage for one request.
pub struct Sealer<'a> {
    ctx: &'a Context,
    resolver: &'a dyn DatasetPathResolver,
    tags: &'a dyn TagLoader,
}

impl<'a> Sealer<'a> {
    pub fn new(ctx: &'a Context, resolver: &'a dyn DatasetPathResolver, tags: &'a dyn TagLoader) -> Self {
        Self { ctx, resolver, tags }
    }

    pub fn seal(&self, merged: &MergedLayer) -> EngineResult<SealedLayer> {
        let tags = self.load_tags(merged)?;
        self.seal_layer(merged, &tags)
    }

    fn load_tags(&self, merged: &MergedLayer) -> EngineResult<HashMap<TagId, Tag>> {
        let ids: BTreeSet<TagId> = merged
            .walk()
            .into_iter()
            .flat_map(|layer| layer.common().tags.tag_ids())
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<TagId> = ids.into_iter().collect();
        self.ctx.check()?;
        let tags = self.tags.load_tags(self.ctx, &ids)?;
        debug!("Loaded {} of {} tags", tags.len(), ids.len());
        Ok(tags.into_iter().map(|tag| (tag.id(), tag)).collect())
    }

    fn seal_layer(&self, layer: &MergedLayer, tags: &HashMap<TagId, Tag>) -> EngineResult<SealedLayer> {
        match layer {
            MergedLayer::Item(item) => Ok(SealedLayer::Item(SealedLayerItem {
                common: self.seal_common(&item.common, tags)?,
                linked_dataset: item.linked_dataset,
                spawned: item.spawned,
            })),
            MergedLayer::Group(group) => {
                let children = group
                    .children
                    .iter()
                    .map(|child| self.seal_layer(child, tags))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(SealedLayer::Group(SealedLayerGroup {
                    common: self.seal_common(&group.common, tags)?,
                    linked_dataset_schema: group.linked_dataset_schema,
                    root: group.root,
                    children,
                }))
            }
        }
    }

    fn seal_common(&self, common: &MergedLayerCommon, tags: &HashMap<TagId, Tag>) -> EngineResult<SealedLayerCommon> {
        Ok(SealedLayerCommon {
            id: common.id,
            scene: common.scene,
            name: common.name.clone(),
            visible: common.visible,
            plugin_id: common.plugin_id.clone(),
            extension_id: common.extension_id.clone(),
            property: self.seal_property(&common.property)?,
            infobox: common.infobox.as_ref().map(|i| self.seal_infobox(i)).transpose()?,
            tags: seal_tags(&common.tags, tags),
        })
    }

    fn seal_infobox(&self, infobox: &MergedInfobox) -> EngineResult<SealedInfobox> {
        let fields = infobox
            .fields
            .iter()
            .map(|field| -> EngineResult<SealedInfoboxField> {
                Ok(SealedInfoboxField {
                    id: field.id,
                    plugin_id: field.plugin_id.clone(),
                    extension_id: field.extension_id.clone(),
                    property: self.seal_property(&field.property)?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(SealedInfobox {
            property: self.seal_property(&infobox.property)?,
            fields,
        })
    }

    pub fn seal_property(&self, property: &MergedProperty) -> EngineResult<SealedProperty> {
        let items = property
            .items
            .iter()
            .map(|item| match item {
                MergedItem::Group(group) => self.seal_group(group, property.linked_dataset).map(SealedItem::Group),
                MergedItem::GroupList(list) => {
                    let groups: Vec<SealedGroup> = list
                        .groups
                        .iter()
                        .map(|g| self.seal_group(g, property.linked_dataset))
                        .collect::<EngineResult<_>>()?;
                    Ok(SealedItem::GroupList(SealedGroupList {
                        id: list.id,
                        schema_group: list.schema_group.clone(),
                        groups,
                    }))
                }
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(SealedProperty {
            original: property.original,
            parent: property.parent,
            linked_dataset: property.linked_dataset,
            schema: property.schema.clone(),
            items,
        })
    }

    fn seal_group(&self, group: &MergedGroup, linked: Option<DatasetId>) -> EngineResult<SealedGroup> {
        let fields = group
            .fields
            .iter()
            .map(|f| self.seal_field(f, linked))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(SealedGroup {
            id: group.id,
            schema_group: group.schema_group.clone(),
            fields,
        })
    }

    fn seal_field(&self, field: &MergedField, linked: Option<DatasetId>) -> EngineResult<SealedField> {
        let (value, source) = match &field.links {
            None => (field.value.clone(), ValueSource::Literal),
            Some(links) => match self.resolve_links(links, field.value_type, linked)? {
                Ok((value, dataset)) => (Some(value), ValueSource::Dataset { dataset }),
                Err(failure) => {
                    warn!("Field '{}' keeps its literal value: {}", field.field, failure);
                    (field.value.clone(), ValueSource::Fallback { failure })
                }
            },
        };
        Ok(SealedField {
            field: field.field.clone(),
            value_type: field.value_type,
            value,
            source,
        })
    }

    /// Follows `links` to a value. The outer error aborts the request; the
    /// inner one only affects this field.
    fn resolve_links(
        &self,
        links: &Links,
        value_type: ValueType,
        linked: Option<DatasetId>,
    ) -> EngineResult<Result<(Value, DatasetId), LinkFailure>> {
        let Some(start) = links.start_dataset().or(linked) else {
            return Ok(Err(LinkFailure::NoStartDataset));
        };
        let path: Vec<DatasetFieldId> = links.hops().iter().map(|link| link.field).collect();

        let chain = match self.resolver.resolve_path(self.ctx, start, &path) {
            Ok(chain) => chain,
            Err(WalkError::Store(e)) if !e.is_not_found() => return Err(EngineError::Store(e)),
            Err(e) => return Ok(Err(LinkFailure::from_walk(&e, start))),
        };
        if chain.len() != links.len() {
            return Ok(Err(LinkFailure::BrokenPath { depth: chain.len() }));
        }
        for (record, link) in chain.iter().zip(links.iter()) {
            if record.schema != link.schema {
                return Ok(Err(LinkFailure::SchemaMismatch {
                    dataset: record.id,
                    expected: link.schema,
                    found: record.schema,
                }));
            }
        }

        // Non-empty: its length equals the link count.
        let terminal = &chain[chain.len() - 1];
        let field_id = links.last().field;
        let Some(field) = terminal.field(field_id) else {
            return Ok(Err(LinkFailure::MissingField {
                dataset: terminal.id,
                field: field_id,
            }));
        };
        let Some(value) = &field.value else {
            return Ok(Err(LinkFailure::EmptyValue {
                dataset: terminal.id,
                field: field_id,
            }));
        };
        Ok(match value.cast(value_type) {
            Some(value) => Ok((value, terminal.id)),
            None => Err(LinkFailure::TypeMismatch {
                dataset: terminal.id,
                field: field_id,
                expected: value_type,
                found: value.value_type(),
            }),
        })
    }
}

fn seal_tags(attached: &LayerTagList, loaded: &HashMap<TagId, Tag>) -> Vec<SealedTag> {
    let sealed = |id: TagId| SealedTag {
        id,
        label: match loaded.get(&id) {
            Some(tag) => tag.label().to_string(),
            None => {
                debug!("Tag {} not found, leaving label empty", id);
                String::new()
            }
        },
        tags: Vec::new(),
    };
    attached
        .iter()
        .map(|tag| match tag {
            LayerTag::Item { id } => sealed(*id),
            LayerTag::Group { id, children } => SealedTag {
                tags: children.iter().map(|c| sealed(*c)).collect(),
                ..sealed(*id)
            },
        })
        .collect()
}
