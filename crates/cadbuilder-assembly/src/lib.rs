#![warn(missing_docs)]

//! Catalog and project store for cadbuilder.
//!
//! [`Store`] owns a [`Workspace`](cadbuilder_ir::Workspace) and is the only
//! way callers mutate it, so the hierarchy rules hold everywhere: parents
//! stay inside their project, the parent relation stays acyclic and
//! deletions cascade. World transforms are derived on demand from the
//! parent chain and never stored.

mod error;
mod save;
mod store;

pub use error::{AssemblyError, AssemblyResult};
pub use save::{ItemUpdate, SaveReport};
pub use store::{world_transform, ComponentUpdate, NewItem, NewProject, Store};
