//! Command implementations. Each returns the text to print; saving the
//! workspace is left to the caller.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cadbuilder_assembly::{ItemUpdate, NewItem, NewProject, SaveReport, Store};
use cadbuilder_ir::{
    CategoryId, CategoryLabel, ComponentId, ItemId, ProcessingStatus, Project, ProjectId,
};
use cadbuilder_math::{rotation_to_xyzw, Pose};
use cadbuilder_placement::{suggest_for_component, PlacementConfig, Suggestion};
use serde::Serialize;
use tracing::info;

/// Body printed by `suggest`.
#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    /// Component the suggestions place.
    pub component_id: ComponentId,
    /// Ranked suggestions, truncated to the limit.
    pub suggestions: Vec<Suggestion>,
    /// Number of suggestions before the limit was applied.
    pub count: usize,
}

/// Register `file` as a component. Processing is a separate step so a
/// failed extraction can still be saved.
pub fn import(
    store: &mut Store,
    file: &Path,
    name: Option<String>,
    label: CategoryLabel,
    category: Option<CategoryId>,
) -> Result<ComponentId> {
    let name = match name {
        Some(n) => n,
        None => file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "component".to_string()),
    };
    Ok(store.add_component(name, file.display().to_string(), label, category)?)
}

/// Extract geometry for a component from its stored file.
pub fn process(store: &mut Store, id: ComponentId) -> Result<String> {
    let component = store.component_mut(id)?;
    let path = PathBuf::from(component.geometry_source());
    cadbuilder_mesh::process_component(component, &path)
        .with_context(|| format!("processing {}", path.display()))?;

    let mut out = String::new();
    writeln!(out, "Component {} ({}): {}", id, component.name, component.status)?;
    if let Some(g) = component.geometry() {
        let size = g.bounding_box().size();
        writeln!(out, "  Size: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z)?;
        writeln!(out, "  Volume: {:.3}", g.volume())?;
        writeln!(out, "  Connection points: {}", g.connection_points().len())?;
    }
    Ok(out)
}

pub fn list_components(store: &Store) -> String {
    let mut out = String::new();
    for c in store.components() {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:<7} {}",
            c.id, c.name, c.category_label, c.status
        );
    }
    if out.is_empty() {
        out.push_str("No components\n");
    }
    out
}

pub fn show_component(store: &Store, id: ComponentId) -> Result<String> {
    Ok(serde_json::to_string_pretty(store.component(id)?)?)
}

pub fn remove_component(store: &mut Store, id: ComponentId) -> Result<String> {
    let removed = store.remove_component(id)?;
    Ok(format!("Removed component {id} and {removed} placed item(s)\n"))
}

pub fn list_projects(store: &Store, owner: Option<&str>, include_public: bool) -> String {
    let mut out = String::new();
    for p in store.projects_for(owner, include_public) {
        let visibility = if p.is_public { "public" } else { "private" };
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:>3} item(s)  {}",
            p.id,
            p.name,
            p.items.len(),
            visibility
        );
    }
    if out.is_empty() {
        out.push_str("No projects\n");
    }
    out
}

/// Project header followed by its item tree.
pub fn show_project(store: &Store, id: ProjectId) -> Result<String> {
    let project = store.project(id)?;
    let mut out = String::new();
    writeln!(out, "Project {}: {}", project.id, project.name)?;
    if !project.description.is_empty() {
        writeln!(out, "  {}", project.description)?;
    }
    if let Some(owner) = &project.owner {
        writeln!(out, "  Owner: {owner}")?;
    }
    writeln!(out, "  Items: {}", project.items.len())?;
    for root in project.roots() {
        write_item(store, project, root.id, 1, &mut out)?;
    }
    Ok(out)
}

fn write_item(
    store: &Store,
    project: &Project,
    id: ItemId,
    depth: usize,
    out: &mut String,
) -> Result<()> {
    let Some(item) = project.item(id) else {
        return Ok(());
    };
    let fallback = store
        .component(item.component)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let p = item.pose.position();
    write!(
        out,
        "{:indent$}[{}] {} at ({:.3}, {:.3}, {:.3})",
        "",
        item.id,
        item.display_name(&fallback),
        p.x,
        p.y,
        p.z,
        indent = depth * 2
    )?;
    if let Some(target) = item.connected_to {
        write!(out, " -> {target}")?;
        if let Some(point) = &item.attached_at_point {
            write!(out, " @ {point}")?;
        }
    }
    out.push('\n');
    for child in project.children(id) {
        write_item(store, project, child.id, depth + 1, out)?;
    }
    Ok(())
}

pub fn create_project(store: &mut Store, new: NewProject) -> String {
    let name = new.name.clone();
    let id = store.create_project(new);
    format!("Created project {id}: {name}\n")
}

pub fn remove_project(store: &mut Store, id: ProjectId) -> Result<String> {
    let project = store.remove_project(id)?;
    Ok(format!(
        "Removed project {id} ({}) with {} item(s)\n",
        project.name,
        project.items.len()
    ))
}

/// Apply a saved scene from a JSON array of item updates.
pub fn save_scene(store: &mut Store, project: ProjectId, payload: &Path) -> Result<SaveReport> {
    let text = std::fs::read_to_string(payload)
        .with_context(|| format!("reading {}", payload.display()))?;
    let updates: Vec<ItemUpdate> = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", payload.display()))?;
    Ok(store.save_project(project, updates)?)
}

pub fn place(
    store: &mut Store,
    project: ProjectId,
    component: ComponentId,
    position: [f64; 3],
    parent: Option<ItemId>,
    name: Option<String>,
) -> Result<ItemId> {
    store.component(component)?;
    let new = NewItem {
        pose: Pose::at(position)?,
        parent,
        custom_name: name,
        ..NewItem::new(component)
    };
    Ok(store.add_item(project, new)?)
}

/// Set an item's local position, and rotation if given. Scale is kept.
pub fn move_item(
    store: &mut Store,
    project: ProjectId,
    item: ItemId,
    position: [f64; 3],
    rotation: Option<[f64; 4]>,
) -> Result<()> {
    let current = store.item(project, item)?.pose;
    let rotation = rotation.unwrap_or_else(|| rotation_to_xyzw(&current.rotation()));
    let s = current.scale();
    let pose = Pose::new(position, rotation, [s.x, s.y, s.z])?;
    Ok(store.update_pose(project, item, pose)?)
}

pub fn remove_item(store: &mut Store, project: ProjectId, item: ItemId) -> Result<String> {
    let removed = store.remove_item(project, item)?;
    Ok(format!("Removed {} item(s)\n", removed.len()))
}

/// Ranked suggestions with at most `limit` kept in the list.
pub fn suggest(
    store: &Store,
    project: ProjectId,
    component: ComponentId,
    limit: usize,
) -> Result<SuggestionResponse> {
    let mut suggestions =
        suggest_for_component(store.workspace(), project, component, &PlacementConfig::default())?;
    let count = suggestions.len();
    suggestions.truncate(limit);
    Ok(SuggestionResponse {
        component_id: component,
        suggestions,
        count,
    })
}

/// Place `component` using the suggestion at `index` of the full ranking.
pub fn apply_suggestion(
    store: &mut Store,
    project: ProjectId,
    component: ComponentId,
    index: usize,
) -> Result<ItemId> {
    let suggestions =
        suggest_for_component(store.workspace(), project, component, &PlacementConfig::default())?;
    let Some(chosen) = suggestions.get(index) else {
        bail!(
            "suggestion {index} out of range ({} available)",
            suggestions.len()
        );
    };
    info!(kind = %chosen.kind, confidence = chosen.confidence, "applying suggestion");
    let new = chosen.to_new_item(component)?;
    Ok(store.add_item(project, new)?)
}

pub fn info(store: &Store, path: &Path) -> String {
    let ws = store.workspace();
    let items: usize = ws.projects.values().map(|p| p.items.len()).sum();
    let mut out = String::new();
    let _ = writeln!(out, "Workspace: {}", path.display());
    let _ = writeln!(out, "  Version: {}", ws.version);
    let _ = writeln!(out, "  Categories: {}", ws.categories.len());
    let _ = writeln!(out, "  Components: {}", ws.components.len());
    for status in [
        ProcessingStatus::Pending,
        ProcessingStatus::Processing,
        ProcessingStatus::Completed,
        ProcessingStatus::Failed,
    ] {
        let n = store.components_by_status(status).len();
        if n > 0 {
            let _ = writeln!(out, "    {status}: {n}");
        }
    }
    let _ = writeln!(out, "  Projects: {}", ws.projects.len());
    let _ = writeln!(out, "  Placed items: {items}");
    out
}
