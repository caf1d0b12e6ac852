//! In-memory store over a [`Workspace`] document.

use std::collections::HashSet;
use std::path::Path;

use cadbuilder_ir::{
    AssemblyItem, Category, CategoryId, CategoryLabel, Component, ComponentId, ItemId,
    ProcessingStatus, Project, ProjectId, Workspace,
};
use cadbuilder_math::{Pose, Transform};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::error::{AssemblyError, AssemblyResult};

/// Request to place a component in a project.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewItem {
    /// Component to place.
    pub component: ComponentId,
    /// Name override.
    pub custom_name: Option<String>,
    /// Local pose.
    pub pose: Pose,
    /// Parent item in the same project.
    pub parent: Option<ItemId>,
    /// Item this one attaches to.
    pub connected_to: Option<ItemId>,
    /// Connection point name on `connected_to`.
    pub attached_at_point: Option<String>,
    /// Display order; defaults to the current item count.
    pub order: Option<u32>,
}

impl NewItem {
    /// Place `component` at the project origin.
    pub fn new(component: ComponentId) -> Self {
        Self {
            component,
            ..Self::default()
        }
    }
}

/// Fields for creating a project.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProject {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Owning user.
    pub owner: Option<String>,
    /// Visible to every user.
    pub is_public: bool,
}

/// Metadata edits for a component. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New functional class.
    pub category_label: Option<CategoryLabel>,
    /// New category; `Some(None)` clears it.
    pub category: Option<Option<CategoryId>>,
}

/// Owns a [`Workspace`] and keeps its invariants.
///
/// Parents always live in the same project as their children and the parent
/// relation never forms a cycle. Removing an item removes its descendants,
/// removing a component removes every item placing it.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub(crate) workspace: Workspace,
}

impl Store {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing document after checking every project's item tree.
    pub fn from_workspace(workspace: Workspace) -> AssemblyResult<Self> {
        for (&project, p) in &workspace.projects {
            check_tree(project, p)?;
        }
        Ok(Self { workspace })
    }

    /// Read-only view of the document.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Load a workspace JSON file.
    pub fn open(path: impl AsRef<Path>) -> AssemblyResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AssemblyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let workspace = Workspace::from_json(&json)?;
        debug!(
            path = %path.display(),
            components = workspace.components.len(),
            projects = workspace.projects.len(),
            "opened workspace"
        );
        Self::from_workspace(workspace)
    }

    /// Write the workspace as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> AssemblyResult<()> {
        let path = path.as_ref();
        let json = self.workspace.to_json()?;
        std::fs::write(path, json).map_err(|source| AssemblyError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Register a category. Names are unique.
    pub fn add_category(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> AssemblyResult<CategoryId> {
        let name = name.into();
        if self.workspace.categories.values().any(|c| c.name == name) {
            return Err(AssemblyError::DuplicateCategory(name));
        }
        let id = self.workspace.alloc_id();
        self.workspace.categories.insert(
            id,
            Category {
                id,
                name,
                description: description.into(),
                icon: icon.into(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// All categories by id.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.workspace.categories.values()
    }

    /// Register a component with status pending.
    #[instrument(skip(self, name, source_file))]
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        source_file: impl Into<String>,
        label: CategoryLabel,
        category: Option<CategoryId>,
    ) -> AssemblyResult<ComponentId> {
        if let Some(cat) = category {
            self.check_category(cat)?;
        }
        let id = self.workspace.alloc_id();
        let mut component = Component::new(id, name, source_file);
        component.category_label = label;
        component.category = category;
        info!(id, name = %component.name, "component registered");
        self.workspace.components.insert(id, component);
        Ok(id)
    }

    /// Look up a component.
    pub fn component(&self, id: ComponentId) -> AssemblyResult<&Component> {
        self.workspace
            .components
            .get(&id)
            .ok_or(AssemblyError::ComponentNotFound(id))
    }

    /// Look up a component for processing.
    pub fn component_mut(&mut self, id: ComponentId) -> AssemblyResult<&mut Component> {
        self.workspace
            .components
            .get_mut(&id)
            .ok_or(AssemblyError::ComponentNotFound(id))
    }

    /// All components by id.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.workspace.components.values()
    }

    /// Components in the given processing state.
    pub fn components_by_status(&self, status: ProcessingStatus) -> Vec<&Component> {
        self.components().filter(|c| c.status == status).collect()
    }

    /// Edit component metadata. Geometry is never touched.
    pub fn update_component(&mut self, id: ComponentId, update: ComponentUpdate) -> AssemblyResult<()> {
        if let Some(Some(cat)) = update.category {
            self.check_category(cat)?;
        }
        let component = self.component_mut(id)?;
        if let Some(name) = update.name {
            component.name = name;
        }
        if let Some(label) = update.category_label {
            component.category_label = label;
        }
        if let Some(category) = update.category {
            component.category = category;
        }
        component.touch();
        Ok(())
    }

    /// Remove a component and every item placing it. Returns the removed item count.
    #[instrument(skip(self))]
    pub fn remove_component(&mut self, id: ComponentId) -> AssemblyResult<usize> {
        self.workspace
            .components
            .remove(&id)
            .ok_or(AssemblyError::ComponentNotFound(id))?;

        let mut removed = 0;
        let project_ids: Vec<ProjectId> = self.workspace.projects.keys().copied().collect();
        for pid in project_ids {
            loop {
                let next = self
                    .project(pid)?
                    .items
                    .iter()
                    .find(|i| i.component == id)
                    .map(|i| i.id);
                let Some(item) = next else { break };
                removed += self.remove_item(pid, item)?.len();
            }
        }
        info!(removed_items = removed, "component removed");
        Ok(removed)
    }

    fn check_category(&self, id: CategoryId) -> AssemblyResult<()> {
        if self.workspace.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(AssemblyError::CategoryNotFound(id))
        }
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Create an empty project.
    pub fn create_project(&mut self, new: NewProject) -> ProjectId {
        let id = self.workspace.alloc_id();
        let mut project = Project::new(id, new.name);
        project.description = new.description;
        project.owner = new.owner;
        project.is_public = new.is_public;
        info!(id, name = %project.name, "project created");
        self.workspace.projects.insert(id, project);
        id
    }

    /// Look up a project.
    pub fn project(&self, id: ProjectId) -> AssemblyResult<&Project> {
        self.workspace
            .projects
            .get(&id)
            .ok_or(AssemblyError::ProjectNotFound(id))
    }

    pub(crate) fn project_mut(&mut self, id: ProjectId) -> AssemblyResult<&mut Project> {
        self.workspace
            .projects
            .get_mut(&id)
            .ok_or(AssemblyError::ProjectNotFound(id))
    }

    /// Rename a project.
    pub fn rename_project(&mut self, id: ProjectId, name: impl Into<String>) -> AssemblyResult<()> {
        let project = self.project_mut(id)?;
        project.name = name.into();
        project.touch();
        Ok(())
    }

    /// Remove a project and its items.
    pub fn remove_project(&mut self, id: ProjectId) -> AssemblyResult<Project> {
        let project = self
            .workspace
            .projects
            .remove(&id)
            .ok_or(AssemblyError::ProjectNotFound(id))?;
        info!(id, items = project.items.len(), "project removed");
        Ok(project)
    }

    /// Projects `owner` may see: their own, plus public ones with `include_public`.
    ///
    /// An anonymous caller (`None`) only ever sees public projects.
    pub fn projects_for(&self, owner: Option<&str>, include_public: bool) -> Vec<&Project> {
        self.workspace
            .projects
            .values()
            .filter(|p| p.visible_to(owner, include_public))
            .collect()
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Place a component in a project.
    #[instrument(skip(self, new), fields(component = new.component))]
    pub fn add_item(&mut self, project: ProjectId, new: NewItem) -> AssemblyResult<ItemId> {
        self.component(new.component)?;
        let p = self.project(project)?;
        if let Some(parent) = new.parent {
            if p.item(parent).is_none() {
                return Err(AssemblyError::ParentNotInProject { project, parent });
            }
        }
        if let Some(target) = new.connected_to {
            if p.item(target).is_none() {
                return Err(AssemblyError::ItemNotFound { project, item: target });
            }
        }
        let order = new.order.unwrap_or(p.items.len() as u32);

        let id = self.workspace.alloc_id();
        let p = self.project_mut(project)?;
        p.items.push(AssemblyItem {
            id,
            component: new.component,
            custom_name: new.custom_name,
            pose: new.pose,
            parent: new.parent,
            connected_to: new.connected_to,
            attached_at_point: new.attached_at_point,
            order,
        });
        p.touch();
        info!(item = id, "item added");
        Ok(id)
    }

    /// Look up an item in a project.
    pub fn item(&self, project: ProjectId, item: ItemId) -> AssemblyResult<&AssemblyItem> {
        self.project(project)?
            .item(item)
            .ok_or(AssemblyError::ItemNotFound { project, item })
    }

    fn item_mut(&mut self, project: ProjectId, item: ItemId) -> AssemblyResult<&mut AssemblyItem> {
        self.project_mut(project)?
            .item_mut(item)
            .ok_or(AssemblyError::ItemNotFound { project, item })
    }

    /// Replace an item's local pose.
    pub fn update_pose(&mut self, project: ProjectId, item: ItemId, pose: Pose) -> AssemblyResult<()> {
        self.item_mut(project, item)?.pose = pose;
        self.project_mut(project)?.touch();
        Ok(())
    }

    /// Rename an item; `None` restores the component name.
    pub fn rename_item(
        &mut self,
        project: ProjectId,
        item: ItemId,
        name: Option<String>,
    ) -> AssemblyResult<()> {
        self.item_mut(project, item)?.custom_name = name;
        Ok(())
    }

    /// Re-parent an item. The parent must be in the same project and must not
    /// be the item itself or one of its descendants.
    pub fn set_parent(
        &mut self,
        project: ProjectId,
        item: ItemId,
        parent: Option<ItemId>,
    ) -> AssemblyResult<()> {
        let p = self.project(project)?;
        if p.item(item).is_none() {
            return Err(AssemblyError::ItemNotFound { project, item });
        }
        if let Some(parent) = parent {
            if p.item(parent).is_none() {
                return Err(AssemblyError::ParentNotInProject { project, parent });
            }
            if creates_cycle(p, item, parent) {
                return Err(AssemblyError::CircularReference(item));
            }
        }
        self.item_mut(project, item)?.parent = parent;
        self.project_mut(project)?.touch();
        Ok(())
    }

    /// Remove an item and its descendants. Links from other items are cleared.
    ///
    /// Returns the removed ids, the item first.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, project: ProjectId, item: ItemId) -> AssemblyResult<Vec<ItemId>> {
        let p = self.project_mut(project)?;
        if p.item(item).is_none() {
            return Err(AssemblyError::ItemNotFound { project, item });
        }
        let removed = p.subtree(item);
        let gone: HashSet<ItemId> = removed.iter().copied().collect();
        p.items.retain(|i| !gone.contains(&i.id));
        for other in &mut p.items {
            if other.connected_to.is_some_and(|t| gone.contains(&t)) {
                other.connected_to = None;
                other.attached_at_point = None;
            }
        }
        p.touch();
        debug!(count = removed.len(), "items removed");
        Ok(removed)
    }

    /// Compose the parent chain with the item's local pose.
    pub fn world_transform(&self, project: ProjectId, item: ItemId) -> AssemblyResult<Transform> {
        let p = self.project(project)?;
        world_transform(p, item).ok_or(AssemblyError::ItemNotFound { project, item })
    }
}

/// World transform of `item`: every ancestor's pose composed, root first.
///
/// Returns `None` when the item is missing. A dangling parent id ends the
/// chain, and a cycle is cut at the first repeated item.
pub fn world_transform(project: &Project, item: ItemId) -> Option<Transform> {
    let start = project.item(item)?;
    let mut transform = start.pose.to_transform();
    let mut visited = HashSet::from([item]);
    let mut current = start.parent;
    while let Some(parent_id) = current {
        if !visited.insert(parent_id) {
            break;
        }
        let Some(parent) = project.item(parent_id) else {
            break;
        };
        transform = parent.pose.to_transform().then(&transform);
        current = parent.parent;
    }
    Some(transform)
}

/// Every parent link stays inside the project and no link closes a loop.
fn check_tree(project: ProjectId, p: &Project) -> AssemblyResult<()> {
    for item in &p.items {
        let Some(parent) = item.parent else { continue };
        if p.item(parent).is_none() {
            return Err(AssemblyError::ParentNotInProject { project, parent });
        }
        if creates_cycle(p, item.id, parent) {
            return Err(AssemblyError::CircularReference(item.id));
        }
    }
    Ok(())
}

/// Whether making `parent` the parent of `item` would close a loop.
fn creates_cycle(project: &Project, item: ItemId, parent: ItemId) -> bool {
    let mut visited = HashSet::new();
    let mut current = Some(parent);
    while let Some(id) = current {
        if id == item || !visited.insert(id) {
            return true;
        }
        current = project.item(id).and_then(|i| i.parent);
    }
    false
}
