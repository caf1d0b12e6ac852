#![warn(missing_docs)]

//! Data model for cadbuilder.
//!
//! Components and categories form the catalog; projects hold ordered
//! assembly items that reference components by id. Everything lives in one
//! [`Workspace`] document that serializes to JSON. The model is purely
//! declarative. Geometry extraction and placement live in other crates.

mod catalog;
mod error;
mod geometry;
mod project;

pub use catalog::{Category, CategoryLabel, Component, PlacementRule, ProcessingStatus};
pub use error::IrError;
pub use geometry::{BoundingBox, ConnectionKind, ConnectionPoint, GeometryIndex};
pub use project::{AssemblyItem, Project};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a component.
pub type ComponentId = u64;
/// Identifier of a project.
pub type ProjectId = u64;
/// Identifier of an assembly item.
pub type ItemId = u64;
/// Identifier of a category.
pub type CategoryId = u64;

/// Current document format version.
pub const WORKSPACE_VERSION: &str = "0.3";

/// The persisted document: catalog plus projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Format version.
    pub version: String,
    /// Next id handed out by [`Workspace::alloc_id`]. Shared by every id kind.
    pub next_id: u64,
    /// Categories by id.
    #[serde(default)]
    pub categories: BTreeMap<CategoryId, Category>,
    /// Components by id.
    #[serde(default)]
    pub components: BTreeMap<ComponentId, Component>,
    /// Projects by id.
    #[serde(default)]
    pub projects: BTreeMap<ProjectId, Project>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            version: WORKSPACE_VERSION.to_string(),
            next_id: 1,
            categories: BTreeMap::new(),
            components: BTreeMap::new(),
            projects: BTreeMap::new(),
        }
    }
}

impl Workspace {
    /// Create a new empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh id.
    pub fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
