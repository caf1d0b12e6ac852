//! Geometry Index: bounding box, volume and connection points of a component.
//!
//! All values are expressed in the component's local frame. The index is a
//! typed container only; extracting it from a mesh is the job of
//! `cadbuilder-mesh`.

use cadbuilder_math::{unit_vec3, vec3, Dir3, Point3, Transform, Vec3};
use serde::{Deserialize, Serialize};

use crate::IrError;

/// Axis-aligned bounding box with `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoxRepr", into = "BoxRepr")]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BoxRepr {
    min: [f64; 3],
    max: [f64; 3],
}

impl BoundingBox {
    /// Create a box from its corners, rejecting NaN and inverted extents.
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Result<Self, IrError> {
        let lo = vec3(min, "bounding box min")?;
        let hi = vec3(max, "bounding box max")?;
        if (0..3).any(|i| lo[i] > hi[i]) {
            return Err(IrError::InvertedBounds { min, max });
        }
        Ok(Self {
            min: Point3::from(lo),
            max: Point3::from(hi),
        })
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some(Self { min, max })
    }

    /// Minimum corner.
    pub fn min(&self) -> Point3 {
        self.min
    }

    /// Maximum corner.
    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        midpoint(&self.min, &self.max)
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// The eight corners.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box enclosing this box after `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        let corners = self.corners().map(|c| transform.apply_point(&c));
        // Eight corners always yield a box.
        Self::from_points(corners.iter()).unwrap_or(*self)
    }
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) * 0.5)
}

impl TryFrom<BoxRepr> for BoundingBox {
    type Error = IrError;

    fn try_from(repr: BoxRepr) -> Result<Self, Self::Error> {
        BoundingBox::new(repr.min, repr.max)
    }
}

impl From<BoundingBox> for BoxRepr {
    fn from(b: BoundingBox) -> Self {
        BoxRepr {
            min: b.min.coords.into(),
            max: b.max.coords.into(),
        }
    }
}

/// Type tag of a connection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Mount point.
    #[default]
    Mount,
    /// Socket.
    Socket,
    /// Screw hole.
    Screw,
    /// Magnetic coupling.
    Magnetic,
    /// Snap fit.
    Snap,
    /// Untyped point; matches anything at reduced confidence.
    Custom,
}

impl ConnectionKind {
    /// Lowercase tag as used in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Mount => "mount",
            ConnectionKind::Socket => "socket",
            ConnectionKind::Screw => "screw",
            ConnectionKind::Magnetic => "magnetic",
            ConnectionKind::Snap => "snap",
            ConnectionKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, oriented attachment locus on a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRepr", into = "PointRepr")]
pub struct ConnectionPoint {
    /// Identifier, unique within the owning component.
    pub name: String,
    /// Type tag.
    pub kind: ConnectionKind,
    /// Other kinds this point accepts besides its own.
    pub compatible_kinds: Vec<ConnectionKind>,
    /// Side label such as "top" or "bottom".
    pub side: Option<String>,
    diameter: Option<f64>,
    position: Point3,
    normal: Dir3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PointRepr {
    name: String,
    #[serde(default)]
    kind: ConnectionKind,
    position: [f64; 3],
    normal: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    compatible_kinds: Vec<ConnectionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    side: Option<String>,
}

impl ConnectionPoint {
    /// Create a point; the normal is normalized and must be non-zero.
    pub fn new(
        name: impl Into<String>,
        kind: ConnectionKind,
        position: [f64; 3],
        normal: [f64; 3],
    ) -> Result<Self, IrError> {
        Ok(Self {
            name: name.into(),
            kind,
            compatible_kinds: Vec::new(),
            diameter: None,
            side: None,
            position: Point3::from(vec3(position, "connection point position")?),
            normal: unit_vec3(normal, "connection point normal")?,
        })
    }

    /// Diameter or size; `None` when unspecified. Always finite and positive.
    pub fn diameter(&self) -> Option<f64> {
        self.diameter
    }

    /// Set the diameter. Zero, negative or non-finite values mean "unspecified".
    pub fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = (diameter.is_finite() && diameter > 0.0).then_some(diameter);
        self
    }

    /// Set the side label.
    pub fn with_side(mut self, side: impl Into<String>) -> Self {
        self.side = Some(side.into());
        self
    }

    /// Declare additional accepted kinds.
    pub fn with_compatible(mut self, kinds: impl IntoIterator<Item = ConnectionKind>) -> Self {
        self.compatible_kinds.extend(kinds);
        self
    }

    /// Local-space position.
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Local-space outward unit normal.
    pub fn normal(&self) -> Dir3 {
        self.normal
    }

    /// Whether this point declares `kind` as acceptable.
    pub fn accepts(&self, kind: ConnectionKind) -> bool {
        self.kind == kind || self.compatible_kinds.contains(&kind)
    }
}

impl TryFrom<PointRepr> for ConnectionPoint {
    type Error = IrError;

    fn try_from(repr: PointRepr) -> Result<Self, Self::Error> {
        let mut point = ConnectionPoint::new(repr.name, repr.kind, repr.position, repr.normal)?
            .with_compatible(repr.compatible_kinds);
        if let Some(d) = repr.diameter {
            point = point.with_diameter(d);
        }
        point.side = repr.side;
        Ok(point)
    }
}

impl From<ConnectionPoint> for PointRepr {
    fn from(p: ConnectionPoint) -> Self {
        PointRepr {
            name: p.name,
            kind: p.kind,
            position: p.position.coords.into(),
            normal: p.normal.into_inner().into(),
            diameter: p.diameter,
            compatible_kinds: p.compatible_kinds,
            side: p.side,
        }
    }
}

/// Derived geometry of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexRepr", into = "IndexRepr")]
pub struct GeometryIndex {
    bounding_box: BoundingBox,
    volume: f64,
    connection_points: Vec<ConnectionPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRepr {
    bounding_box: BoundingBox,
    volume: f64,
    #[serde(default)]
    connection_points: Vec<ConnectionPoint>,
}

impl GeometryIndex {
    /// Create an index; the volume must be finite and non-negative.
    pub fn new(
        bounding_box: BoundingBox,
        volume: f64,
        connection_points: Vec<ConnectionPoint>,
    ) -> Result<Self, IrError> {
        if !volume.is_finite() || volume < 0.0 {
            return Err(IrError::InvalidVolume(volume));
        }
        Ok(Self {
            bounding_box,
            volume,
            connection_points,
        })
    }

    /// Local-space bounding box.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Connection points in declaration order.
    pub fn connection_points(&self) -> &[ConnectionPoint] {
        &self.connection_points
    }

    /// Enclosed volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Look up a connection point by name.
    pub fn connection_point(&self, name: &str) -> Option<&ConnectionPoint> {
        self.connection_points.iter().find(|p| p.name == name)
    }

    /// Drop every connection point, keeping bounds and volume.
    pub fn without_connection_points(&self) -> Self {
        Self {
            connection_points: Vec::new(),
            ..self.clone()
        }
    }
}

impl TryFrom<IndexRepr> for GeometryIndex {
    type Error = IrError;

    fn try_from(repr: IndexRepr) -> Result<Self, Self::Error> {
        GeometryIndex::new(repr.bounding_box, repr.volume, repr.connection_points)
    }
}

impl From<GeometryIndex> for IndexRepr {
    fn from(g: GeometryIndex) -> Self {
        IndexRepr {
            bounding_box: g.bounding_box,
            volume: g.volume,
            connection_points: g.connection_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cadbuilder_math::Pose;

    #[test]
    fn bounding_box_rejects_inverted() {
        assert!(BoundingBox::new([0.0; 3], [1.0, 1.0, 1.0]).is_ok());
        assert!(matches!(
            BoundingBox::new([0.0, 2.0, 0.0], [1.0, 1.0, 1.0]),
            Err(IrError::InvertedBounds { .. })
        ));
        assert!(BoundingBox::new([f64::NAN, 0.0, 0.0], [1.0; 3]).is_err());
    }

    #[test]
    fn bounding_box_center_and_size() {
        let b = BoundingBox::new([0.0, 0.0, 0.0], [10.0, 4.0, 2.0]).unwrap();
        assert_relative_eq!(b.center(), Point3::new(5.0, 2.0, 1.0));
        assert_relative_eq!(b.size(), Vec3::new(10.0, 4.0, 2.0));
    }

    #[test]
    fn bounding_box_transformed_by_rotation() {
        let b = BoundingBox::new([0.0, 0.0, 0.0], [10.0, 2.0, 1.0]).unwrap();
        // 90° about Z: x extent becomes y extent.
        let pose = Pose::new(
            [0.0; 3],
            [0.0, 0.0, std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2],
            [1.0; 3],
        )
        .unwrap();
        let w = b.transformed(&pose.to_transform());
        assert_relative_eq!(w.min(), Point3::new(-2.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(w.max(), Point3::new(0.0, 10.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn connection_point_normalizes_normal() {
        let p = ConnectionPoint::new("top", ConnectionKind::Mount, [0.0, 0.0, 10.0], [0.0, 0.0, 5.0])
            .unwrap();
        assert_relative_eq!(p.normal().into_inner(), Vec3::z());
        assert!(ConnectionPoint::new("bad", ConnectionKind::Mount, [0.0; 3], [0.0; 3]).is_err());
    }

    #[test]
    fn connection_point_diameter_zero_is_unspecified() {
        let p = ConnectionPoint::new("hole", ConnectionKind::Screw, [0.0; 3], [1.0, 0.0, 0.0])
            .unwrap()
            .with_diameter(0.0);
        assert_eq!(p.diameter(), None);
        assert_eq!(p.clone().with_diameter(f64::NAN).diameter(), None);
        assert_eq!(p.with_diameter(3.0).diameter(), Some(3.0));
    }

    #[test]
    fn connection_point_json_shape() {
        let json = r#"{"name":"top","kind":"snap","position":[0,0,10],"normal":[0,0,2],"side":"top"}"#;
        let p: ConnectionPoint = serde_json::from_str(json).unwrap();
        assert_eq!(p.kind, ConnectionKind::Snap);
        assert_eq!(p.side.as_deref(), Some("top"));
        assert_relative_eq!(p.normal().into_inner(), Vec3::z());

        let bad = r#"{"name":"x","position":[0,0,0],"normal":[0,0,0]}"#;
        assert!(serde_json::from_str::<ConnectionPoint>(bad).is_err());
    }

    #[test]
    fn geometry_index_rejects_negative_volume() {
        let b = BoundingBox::new([0.0; 3], [1.0; 3]).unwrap();
        assert!(matches!(
            GeometryIndex::new(b, -1.0, vec![]),
            Err(IrError::InvalidVolume(_))
        ));
        let g = GeometryIndex::new(b, 1.0, vec![]).unwrap();
        assert_eq!(g.volume(), 1.0);
        assert!(g.connection_points().is_empty());
    }
}
