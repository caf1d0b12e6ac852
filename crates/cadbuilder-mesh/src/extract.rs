//! Scene walking and geometry summaries.

use std::path::Path;

use cadbuilder_ir::{BoundingBox, ConnectionKind, ConnectionPoint, GeometryIndex};
use cadbuilder_math::{Point3, Transform};
use nalgebra::Matrix4;
use tracing::{debug, info, instrument};

use crate::error::{MeshError, Result};

/// Extensions the decoder accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["glb", "gltf"];

/// A triangle in scene space.
pub type Triangle = [Point3; 3];

/// Result of decoding one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMesh {
    /// Bounds, volume and the six face connection points.
    pub geometry: GeometryIndex,
    /// Volume-weighted centroid, or the box center for open meshes.
    pub centroid: Point3,
    /// Number of triangles read.
    pub triangle_count: usize,
}

/// Decode a `.glb`/`.gltf` file and summarize its geometry.
///
/// External buffers referenced by a `.gltf` are resolved relative to the file.
#[instrument]
pub fn extract_geometry(path: &Path) -> Result<ExtractedMesh> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(MeshError::UnsupportedFormat(if ext.is_empty() {
            "<none>".to_string()
        } else {
            ext
        }));
    }
    // Surface missing files as plain IO errors.
    std::fs::metadata(path)?;
    let (document, buffers, _images) = gltf::import(path)?;
    let triangles = scene_triangles(&document, &buffers);
    let mesh = summarize(&triangles)?;
    info!(
        triangles = mesh.triangle_count,
        volume = mesh.geometry.volume(),
        "extracted geometry"
    );
    Ok(mesh)
}

/// Decode GLB bytes or self-contained GLTF JSON.
pub fn extract_geometry_from_slice(bytes: &[u8]) -> Result<ExtractedMesh> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    let triangles = scene_triangles(&document, &buffers);
    summarize(&triangles)
}

/// Collect all triangles of the default scene with node transforms applied.
///
/// Documents without a scene fall back to every mesh in local space.
pub fn scene_triangles(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<Triangle> {
    let mut out = Vec::new();
    let scene = document.default_scene().or_else(|| document.scenes().next());
    let Some(scene) = scene else {
        let identity = Transform::identity();
        for mesh in document.meshes() {
            append_mesh(&mesh, &identity, buffers, &mut out);
        }
        return out;
    };

    let mut stack: Vec<(gltf::Node, Matrix4<f64>)> =
        scene.nodes().map(|n| (n, Matrix4::identity())).collect();
    while let Some((node, parent)) = stack.pop() {
        let world = parent * node_matrix(&node);
        if let Some(mesh) = node.mesh() {
            append_mesh(&mesh, &Transform { matrix: world }, buffers, &mut out);
        }
        stack.extend(node.children().map(|c| (c, world)));
    }
    out
}

fn node_matrix(node: &gltf::Node) -> Matrix4<f64> {
    // glTF matrices are column-major.
    let m = node.transform().matrix();
    Matrix4::from_fn(|r, c| f64::from(m[c][r]))
}

fn append_mesh(
    mesh: &gltf::Mesh,
    transform: &Transform,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<Triangle>,
) {
    // Mirroring transforms flip winding.
    let mirrored = transform.matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
            continue;
        }
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Point3> = positions
            .map(|p| {
                transform.apply_point(&Point3::new(
                    f64::from(p[0]),
                    f64::from(p[1]),
                    f64::from(p[2]),
                ))
            })
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        for tri in indices.chunks_exact(3) {
            let get = |i: u32| positions.get(i as usize).copied();
            if let (Some(a), Some(b), Some(c)) = (get(tri[0]), get(tri[1]), get(tri[2])) {
                out.push(if mirrored { [a, c, b] } else { [a, b, c] });
            }
        }
    }
}

/// Bounds, divergence-theorem volume, centroid and face points of a triangle set.
pub fn summarize(triangles: &[Triangle]) -> Result<ExtractedMesh> {
    let bounds = BoundingBox::from_points(triangles.iter().flatten()).ok_or(MeshError::NoTriangles)?;

    let mut total = 0.0;
    let mut weighted = nalgebra::Vector3::zeros();
    for [v0, v1, v2] in triangles {
        // Signed volume of the tetrahedron with the origin, times six.
        let vol = v0.coords.dot(&v1.coords.cross(&v2.coords));
        total += vol;
        weighted += (v0.coords + v1.coords + v2.coords) * vol;
    }
    let centroid = if total.abs() < 1e-15 {
        bounds.center()
    } else {
        Point3::from(weighted / (4.0 * total))
    };
    let volume = (total / 6.0).abs();

    let points = face_connection_points(&bounds, &centroid)?;
    Ok(ExtractedMesh {
        geometry: GeometryIndex::new(bounds, volume, points)?,
        centroid,
        triangle_count: triangles.len(),
    })
}

/// The six bounding-box face points: bottom, top, left, right, front, back.
///
/// Bottom and top sit on the box corners; the side points take their
/// off-axis coordinates from `center`.
pub fn face_connection_points(bounds: &BoundingBox, center: &Point3) -> Result<Vec<ConnectionPoint>> {
    let (lo, hi, c) = (bounds.min(), bounds.max(), center);
    let faces: [(&str, [f64; 3], [f64; 3]); 6] = [
        ("bottom", [lo.x, lo.y, lo.z], [0.0, 0.0, -1.0]),
        ("top", [hi.x, hi.y, hi.z], [0.0, 0.0, 1.0]),
        ("left", [lo.x, lo.y, c.z], [-1.0, 0.0, 0.0]),
        ("right", [hi.x, hi.y, c.z], [1.0, 0.0, 0.0]),
        ("front", [c.x, lo.y, c.z], [0.0, -1.0, 0.0]),
        ("back", [c.x, hi.y, c.z], [0.0, 1.0, 0.0]),
    ];
    faces
        .into_iter()
        .map(|(side, position, normal)| -> Result<ConnectionPoint> {
            Ok(ConnectionPoint::new(side, ConnectionKind::Mount, position, normal)?.with_side(side))
        })
        .collect()
}
