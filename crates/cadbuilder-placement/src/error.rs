use cadbuilder_ir::{ComponentId, ProjectId};
use thiserror::Error;

/// Errors from resolving a suggestion query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The project does not exist.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    /// The candidate component does not exist.
    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),
}
