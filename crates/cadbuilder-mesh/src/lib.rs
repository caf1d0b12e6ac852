#![warn(missing_docs)]

//! Geometry extraction for cadbuilder components.
//!
//! Decodes GLB/GLTF files with the `gltf` crate and reduces them to a
//! [`GeometryIndex`](cadbuilder_ir::GeometryIndex): world-space bounds, the
//! enclosed volume and six face connection points. Other formats (STEP, STL,
//! OBJ) must be converted to GLB by an external service first.

mod error;
mod extract;

pub use error::{MeshError, Result};
pub use extract::{
    extract_geometry, extract_geometry_from_slice, face_connection_points, scene_triangles,
    summarize, ExtractedMesh, Triangle, SUPPORTED_EXTENSIONS,
};

use std::path::Path;

use cadbuilder_ir::Component;
use tracing::{info, instrument, warn};

/// Run extraction for `component` and record the outcome on it.
///
/// Moves the component through processing to completed, or to failed with
/// the error message kept. A component that is already completed is left
/// untouched.
#[instrument(skip(component), fields(component = component.id))]
pub fn process_component(component: &mut Component, path: &Path) -> Result<()> {
    if component.is_completed() {
        warn!("component already processed");
        return Ok(());
    }
    component.mark_processing();
    match extract_geometry(path) {
        Ok(mesh) => {
            info!(
                volume = mesh.geometry.volume(),
                points = mesh.geometry.connection_points().len(),
                "component processed"
            );
            component.complete(mesh.geometry);
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "component processing failed");
            component.fail(err.to_string());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures::box_glb;
    use cadbuilder_ir::{CategoryLabel, ProcessingStatus};

    #[test]
    fn process_completes_and_fills_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roller.glb");
        std::fs::write(&path, box_glb([20.0, 20.0, 80.0], r#"{"mesh": 0}"#)).unwrap();

        let mut c = Component::new(1, "roller", path.display().to_string());
        c.category_label = CategoryLabel::Roller;
        process_component(&mut c, &path).unwrap();

        assert_eq!(c.status, ProcessingStatus::Completed);
        assert_eq!(c.mountable_sides, vec!["bottom".to_string()]);
        assert_eq!(c.compatible_types, vec![CategoryLabel::Base]);
        assert_eq!(c.geometry().unwrap().connection_points().len(), 6);
    }

    #[test]
    fn process_failure_keeps_message() {
        let mut c = Component::new(1, "bracket", "bracket.step");
        let err = process_component(&mut c, Path::new("bracket.step")).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat(_)));
        assert_eq!(c.status, ProcessingStatus::Failed);
        assert!(c.processing_error.as_deref().unwrap().contains("step"));
        assert!(c.geometry().is_none());
    }

    #[test]
    fn completed_component_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.glb");
        std::fs::write(&path, box_glb([1.0, 1.0, 1.0], r#"{"mesh": 0}"#)).unwrap();
        let mut c = Component::new(1, "a", "a.glb");
        process_component(&mut c, &path).unwrap();
        let before = c.clone();

        // A second run does not even look at the (now missing) file.
        std::fs::remove_file(&path).unwrap();
        process_component(&mut c, &path).unwrap();
        assert_eq!(c, before);
    }
}
