use scenery_types::{SceneId, TagId};
use serde::{Deserialize, Serialize};

/// A scene-scoped label attachable to layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tag {
    Item(TagItem),
    Group(TagGroup),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagItem {
    pub id: TagId,
    pub scene: SceneId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TagId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroup {
    pub id: TagId,
    pub scene: SceneId,
    pub label: String,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

impl Tag {
    pub fn item(scene: SceneId, label: impl Into<String>) -> Self {
        Tag::Item(TagItem {
            id: TagId::new(),
            scene,
            label: label.into(),
            parent: None,
        })
    }

    pub fn group(scene: SceneId, label: impl Into<String>, tags: Vec<TagId>) -> Self {
        Tag::Group(TagGroup {
            id: TagId::new(),
            scene,
            label: label.into(),
            tags,
        })
    }

    pub fn id(&self) -> TagId {
        match self {
            Tag::Item(t) => t.id,
            Tag::Group(t) => t.id,
        }
    }

    pub fn scene(&self) -> SceneId {
        match self {
            Tag::Item(t) => t.scene,
            Tag::Group(t) => t.scene,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Tag::Item(t) => &t.label,
            Tag::Group(t) => &t.label,
        }
    }
}
