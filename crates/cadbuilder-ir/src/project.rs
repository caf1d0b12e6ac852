//! Projects and their assembly items.

use std::collections::HashSet;

use cadbuilder_math::Pose;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ComponentId, ItemId, ProjectId};

/// One placed instance of a component inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyItem {
    /// Unique id.
    pub id: ItemId,
    /// Placed component.
    pub component: ComponentId,
    /// Name override.
    #[serde(default)]
    pub custom_name: Option<String>,
    /// Local pose relative to the parent, or the project root.
    #[serde(default)]
    pub pose: Pose,
    /// Parent item in the same project.
    #[serde(default)]
    pub parent: Option<ItemId>,
    /// Item this one was attached to by a connection suggestion.
    #[serde(default)]
    pub connected_to: Option<ItemId>,
    /// Target connection point name used for that attachment.
    #[serde(default)]
    pub attached_at_point: Option<String>,
    /// Display order within the project.
    #[serde(default)]
    pub order: u32,
}

impl AssemblyItem {
    /// Custom name if set, else `fallback`.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.custom_name.as_deref().unwrap_or(fallback)
    }
}

/// A named assembly of placed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique id.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Owning user, if any.
    #[serde(default)]
    pub owner: Option<String>,
    /// Visible to every user.
    #[serde(default)]
    pub is_public: bool,
    /// Items in insertion order.
    #[serde(default)]
    pub items: Vec<AssemblyItem>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Empty project.
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: String::new(),
            owner: None,
            is_public: false,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up an item.
    pub fn item(&self, id: ItemId) -> Option<&AssemblyItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Look up an item mutably.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut AssemblyItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Direct children of `id`.
    pub fn children(&self, id: ItemId) -> impl Iterator<Item = &AssemblyItem> {
        self.items.iter().filter(move |i| i.parent == Some(id))
    }

    /// Items without a parent.
    pub fn roots(&self) -> impl Iterator<Item = &AssemblyItem> {
        self.items.iter().filter(|i| i.parent.is_none())
    }

    /// `id` followed by all of its descendants, breadth first. Each item
    /// appears once even if the parent links loop.
    pub fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut seen = HashSet::from([id]);
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            for child in self.children(current) {
                if seen.insert(child.id) {
                    out.push(child.id);
                }
            }
            i += 1;
        }
        out
    }

    /// Whether `user` may see this project.
    pub fn visible_to(&self, user: Option<&str>, include_public: bool) -> bool {
        let owned = user.is_some() && self.owner.as_deref() == user;
        owned || (include_public && self.is_public)
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
