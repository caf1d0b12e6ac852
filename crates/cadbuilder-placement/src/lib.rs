#![warn(missing_docs)]

//! Placement suggestion engine for cadbuilder.
//!
//! Given the placed items of a project and a candidate component, proposes
//! world poses for the candidate, ranked by confidence:
//!
//! - **connection**: a candidate connection point mated onto a compatible
//!   target point, rotated so the two normals oppose.
//! - **snap_top / snap_bottom / snap_left / snap_right / snap_front /
//!   snap_back**: the candidate's box placed flush against a face of an
//!   item's world box, unrotated.
//!
//! The engine is a pure function of its inputs. [`suggest`] works on a
//! resolved [`AssemblySnapshot`]; [`suggest_for_component`] resolves one from
//! a workspace first.
//!
//! # Example
//!
//! ```
//! use cadbuilder_ir::{BoundingBox, GeometryIndex};
//! use cadbuilder_math::Pose;
//! use cadbuilder_placement::{suggest, AssemblySnapshot, PlacedItem, PlacementConfig};
//!
//! let table = GeometryIndex::new(BoundingBox::new([0.0; 3], [10.0; 3]).unwrap(), 1000.0, vec![]).unwrap();
//! let cup = GeometryIndex::new(BoundingBox::new([0.0; 3], [4.0; 3]).unwrap(), 64.0, vec![]).unwrap();
//! let snapshot = AssemblySnapshot::new(vec![PlacedItem {
//!     item: 1,
//!     name: "table".into(),
//!     transform: Pose::identity().to_transform(),
//!     geometry: Some(&table),
//! }]);
//! let ranked = suggest(&snapshot, Some(&cup), &PlacementConfig::default());
//! assert_eq!(ranked.len(), 6);
//! assert_eq!(ranked[0].position, [3.0, 3.0, 10.0]);
//! ```

mod config;
mod engine;
mod error;
mod resolve;
mod suggestion;

pub use config::PlacementConfig;
pub use engine::{normal_score, size_score, suggest, type_score, AssemblySnapshot, PlacedItem};
pub use error::PlacementError;
pub use resolve::{snapshot, suggest_for_component};
pub use suggestion::{Suggestion, SuggestionKind};
