#![warn(missing_docs)]

//! Math types for cadbuilder assemblies.
//!
//! Thin wrappers around nalgebra providing the value types an assembly
//! needs: points, vectors, unit directions, unit-quaternion rotations, the
//! validated local [`Pose`] stored on every assembly item, and the 4x4 world
//! [`Transform`] obtained by composing a parent chain.
//!
//! Every constructor that accepts raw floats rejects NaN/infinite input and
//! normalizes rotations, so downstream code never sees a malformed transform.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A unit quaternion rotation.
pub type Rotation = UnitQuaternion<f64>;

/// Lengths below this are treated as zero when normalizing.
pub const NORMALIZE_EPSILON: f64 = 1e-12;

/// Errors raised when raw floats cannot form a valid value type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// A component is NaN or infinite.
    #[error("{what} has a non-finite component")]
    NonFinite {
        /// Which value was rejected.
        what: &'static str,
    },

    /// A direction or quaternion has (near) zero length.
    #[error("{what} has zero length")]
    ZeroLength {
        /// Which value was rejected.
        what: &'static str,
    },

    /// Scale factors must be strictly positive.
    #[error("scale component must be positive, got {0}")]
    DegenerateScale(f64),
}

/// Validate a raw `[x, y, z]` triple.
pub fn vec3(v: [f64; 3], what: &'static str) -> Result<Vec3, MathError> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(Vec3::new(v[0], v[1], v[2]))
    } else {
        Err(MathError::NonFinite { what })
    }
}

/// Validate and normalize a raw direction.
pub fn unit_vec3(v: [f64; 3], what: &'static str) -> Result<Dir3, MathError> {
    let raw = vec3(v, what)?;
    Dir3::try_new(raw, NORMALIZE_EPSILON).ok_or(MathError::ZeroLength { what })
}

/// Build a rotation from `[x, y, z, w]`, normalizing it.
pub fn rotation_from_xyzw(q: [f64; 4]) -> Result<Rotation, MathError> {
    const WHAT: &str = "rotation quaternion";
    if !q.iter().all(|c| c.is_finite()) {
        return Err(MathError::NonFinite { what: WHAT });
    }
    let quat = Quaternion::new(q[3], q[0], q[1], q[2]);
    if quat.norm() < NORMALIZE_EPSILON {
        return Err(MathError::ZeroLength { what: WHAT });
    }
    Ok(UnitQuaternion::from_quaternion(quat))
}

/// Rotation as `[x, y, z, w]`.
pub fn rotation_to_xyzw(r: &Rotation) -> [f64; 4] {
    let c = r.quaternion().coords;
    [c.x, c.y, c.z, c.w]
}

/// Some unit vector perpendicular to `v`.
pub fn any_perpendicular(v: &Dir3) -> Dir3 {
    let v = v.as_ref();
    // Cross with the basis axis least aligned with v.
    let basis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vec3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    Dir3::new_normalize(v.cross(&basis))
}

/// Shortest-arc rotation taking `from` onto `to`.
///
/// Anti-parallel inputs have no unique shortest arc; a half turn about an
/// arbitrary perpendicular axis is returned.
pub fn rotation_between(from: &Dir3, to: &Dir3) -> Rotation {
    UnitQuaternion::rotation_between_axis(from, to)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&any_perpendicular(from), PI))
}

/// Local placement of an assembly item: translation, rotation, scale.
///
/// Applied to a point as `position + rotation * (scale ⊙ p)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PoseRepr", into = "PoseRepr")]
pub struct Pose {
    position: Vec3,
    rotation: Rotation,
    scale: Vec3,
}

impl Pose {
    /// Identity pose.
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Rotation::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Build a pose from raw components, validating each.
    pub fn new(position: [f64; 3], rotation: [f64; 4], scale: [f64; 3]) -> Result<Self, MathError> {
        let scale = vec3(scale, "scale")?;
        if let Some(bad) = scale.iter().copied().find(|s| *s < NORMALIZE_EPSILON) {
            return Err(MathError::DegenerateScale(bad));
        }
        Ok(Self {
            position: vec3(position, "position")?,
            rotation: rotation_from_xyzw(rotation)?,
            scale,
        })
    }

    /// Pure translation.
    pub fn at(position: [f64; 3]) -> Result<Self, MathError> {
        Ok(Self {
            position: vec3(position, "position")?,
            ..Self::identity()
        })
    }

    /// Translation component.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation component.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Per-axis scale component.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Homogeneous matrix `T * R * S`.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// This pose as a [`Transform`].
    pub fn to_transform(&self) -> Transform {
        Transform {
            matrix: self.to_matrix(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Serialized form of a [`Pose`]: fixed-shape arrays, quaternion as `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PoseRepr {
    #[serde(default)]
    position: [f64; 3],
    #[serde(default = "identity_xyzw")]
    rotation: [f64; 4],
    #[serde(default = "unit_scale")]
    scale: [f64; 3],
}

fn identity_xyzw() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl TryFrom<PoseRepr> for Pose {
    type Error = MathError;

    fn try_from(repr: PoseRepr) -> Result<Self, Self::Error> {
        Pose::new(repr.position, repr.rotation, repr.scale)
    }
}

impl From<Pose> for PoseRepr {
    fn from(pose: Pose) -> Self {
        PoseRepr {
            position: pose.position.into(),
            rotation: rotation_to_xyzw(&pose.rotation),
            scale: pose.scale.into(),
        }
    }
}

/// A 4x4 affine transformation matrix, used for world transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// For a parent world transform `p` and a child local transform `c`,
    /// `p.then(&c)` is the child's world transform.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a normal vector (uses inverse transpose of upper-left 3x3).
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let m3: Matrix3<f64> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        match m3.try_inverse() {
            Some(inv) => inv.transpose() * n,
            // Degenerate transform, return input unchanged
            None => *n,
        }
    }

    /// Transform a unit normal and renormalize it.
    pub fn apply_dir(&self, n: &Dir3) -> Option<Dir3> {
        Dir3::try_new(self.apply_normal(n.as_ref()), NORMALIZE_EPSILON)
    }

    /// Where the local origin lands.
    pub fn origin(&self) -> Point3 {
        Point3::new(
            self.matrix[(0, 3)],
            self.matrix[(1, 3)],
            self.matrix[(2, 3)],
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation() {
        let t = Pose::at([10.0, 20.0, 30.0]).unwrap().to_transform();
        let result = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(result, Point3::new(11.0, 22.0, 33.0), epsilon = 1e-12);
        assert_relative_eq!(t.origin(), Point3::new(10.0, 20.0, 30.0), epsilon = 1e-12);
    }

    #[test]
    fn test_pose_matrix_order() {
        // Scale, then rotate 90° about Z, then translate.
        let rot = UnitQuaternion::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2);
        let pose = Pose::new([5.0, 0.0, 0.0], rotation_to_xyzw(&rot), [2.0, 2.0, 2.0]).unwrap();
        let p = pose.to_transform().apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(5.0, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_parent_child() {
        let parent = Pose::at([0.0, 0.0, 10.0]).unwrap().to_transform();
        let child = Pose::at([1.0, 0.0, 0.0]).unwrap().to_transform();
        let world = parent.then(&child);
        assert_relative_eq!(world.origin(), Point3::new(1.0, 0.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_normal_under_nonuniform_scale() {
        // A 45° face normal stays perpendicular to the stretched face.
        let pose = Pose::new([0.0; 3], [0.0, 0.0, 0.0, 1.0], [2.0, 1.0, 1.0]).unwrap();
        let n = Dir3::new_normalize(Vec3::new(1.0, 1.0, 0.0));
        let out = pose.to_transform().apply_dir(&n).unwrap();
        let tangent = pose.to_transform().apply_vec(&Vec3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(out.dot(&tangent), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_from_xyzw_normalizes() {
        let r = rotation_from_xyzw([0.0, 0.0, 0.0, 2.0]).unwrap();
        assert_eq!(rotation_to_xyzw(&r), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rejects_nan_and_zero() {
        assert!(matches!(
            rotation_from_xyzw([f64::NAN, 0.0, 0.0, 1.0]),
            Err(MathError::NonFinite { .. })
        ));
        assert!(matches!(
            rotation_from_xyzw([0.0; 4]),
            Err(MathError::ZeroLength { .. })
        ));
        assert!(matches!(
            unit_vec3([0.0; 3], "normal"),
            Err(MathError::ZeroLength { what: "normal" })
        ));
        assert!(matches!(
            Pose::new([0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 1.0]),
            Err(MathError::DegenerateScale(_))
        ));
        assert_eq!(
            Pose::new([0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0, 1.0, -2.0]),
            Err(MathError::DegenerateScale(-2.0))
        );
        assert!(serde_json::from_str::<Pose>(r#"{"scale":[-1.0,1.0,1.0]}"#).is_err());
        assert!(Pose::at([f64::INFINITY, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_rotation_between_general() {
        let from = Dir3::new_normalize(Vec3::x());
        let to = Dir3::new_normalize(Vec3::new(0.0, 1.0, 1.0));
        let r = rotation_between(&from, &to);
        assert_relative_eq!(r * from.into_inner(), to.into_inner(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_between_antiparallel() {
        let from = Dir3::new_normalize(Vec3::new(0.0, 0.0, 1.0));
        let to = Dir3::new_normalize(Vec3::new(0.0, 0.0, -1.0));
        let r = rotation_between(&from, &to);
        assert_relative_eq!(r * from.into_inner(), to.into_inner(), epsilon = 1e-12);
    }

    #[test]
    fn test_pose_serde_shape() {
        let pose = Pose::at([1.0, 2.0, 3.0]).unwrap();
        let json = serde_json::to_string(&pose).unwrap();
        assert_eq!(
            json,
            r#"{"position":[1.0,2.0,3.0],"rotation":[0.0,0.0,0.0,1.0],"scale":[1.0,1.0,1.0]}"#
        );
        let back: Pose = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }

    #[test]
    fn test_pose_serde_defaults_and_validation() {
        let pose: Pose = serde_json::from_str(r#"{"position":[1.0,0.0,0.0]}"#).unwrap();
        assert_eq!(pose.scale(), Vec3::new(1.0, 1.0, 1.0));
        let unnormalized: Pose = serde_json::from_str(r#"{"rotation":[0.0,0.0,0.0,4.0]}"#).unwrap();
        assert_relative_eq!(unnormalized.rotation().quaternion().norm(), 1.0, epsilon = 1e-12);
        assert!(serde_json::from_str::<Pose>(r#"{"rotation":[0.0,0.0,0.0,0.0]}"#).is_err());
    }
}
