//! Turning a (project, component) query into an engine call.

use cadbuilder_assembly::world_transform;
use cadbuilder_ir::{ComponentId, Project, ProjectId, Workspace};
use tracing::{info, instrument};

use crate::config::PlacementConfig;
use crate::engine::{suggest, AssemblySnapshot, PlacedItem};
use crate::error::PlacementError;
use crate::suggestion::Suggestion;

/// Resolve every item of `project` to its world transform and geometry.
///
/// Items whose component is missing or not yet processed keep their slot
/// with no geometry.
pub fn snapshot<'a>(workspace: &'a Workspace, project: &Project) -> AssemblySnapshot<'a> {
    let items = project
        .items
        .iter()
        .filter_map(|item| {
            let component = workspace.components.get(&item.component);
            let fallback = component
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("component {}", item.component));
            Some(PlacedItem {
                item: item.id,
                name: item.display_name(&fallback).to_string(),
                transform: world_transform(project, item.id)?,
                geometry: component.and_then(|c| c.geometry()),
            })
        })
        .collect();
    AssemblySnapshot::new(items)
}

/// Suggest placements of `component` in `project`.
#[instrument(skip(workspace, config))]
pub fn suggest_for_component(
    workspace: &Workspace,
    project: ProjectId,
    component: ComponentId,
    config: &PlacementConfig,
) -> Result<Vec<Suggestion>, PlacementError> {
    let p = workspace
        .projects
        .get(&project)
        .ok_or(PlacementError::ProjectNotFound(project))?;
    let candidate = workspace
        .components
        .get(&component)
        .ok_or(PlacementError::ComponentNotFound(component))?;

    let snap = snapshot(workspace, p);
    let suggestions = suggest(&snap, candidate.geometry(), config);
    info!(
        items = snap.items.len(),
        suggestions = suggestions.len(),
        status = %candidate.status,
        "placement query"
    );
    Ok(suggestions)
}
