//! Error types for store operations.

use std::path::PathBuf;

use cadbuilder_ir::{CategoryId, ComponentId, ItemId, ProjectId};
use cadbuilder_math::MathError;
use thiserror::Error;

/// Result type for store operations.
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// No component with this id.
    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),

    /// No project with this id.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    /// No item with this id in the project.
    #[error("item {item} not found in project {project}")]
    ItemNotFound {
        /// Project searched.
        project: ProjectId,
        /// The missing item id.
        item: ItemId,
    },

    /// No category with this id.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    /// Category names are unique.
    #[error("category '{0}' already exists")]
    DuplicateCategory(String),

    /// Parent item lives in another project or does not exist.
    #[error("parent {parent} is not in project {project}")]
    ParentNotInProject {
        /// Project of the child.
        project: ProjectId,
        /// The rejected parent.
        parent: ItemId,
    },

    /// The parent change would close a loop.
    #[error("circular parent reference detected for item {0}")]
    CircularReference(ItemId),

    /// Pose values were rejected.
    #[error("invalid pose: {0}")]
    InvalidPose(#[from] MathError),

    /// I/O error during file operations.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The workspace document could not be encoded or decoded.
    #[error("workspace document error: {0}")]
    Json(#[from] serde_json::Error),
}
