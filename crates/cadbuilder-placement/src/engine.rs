//! Ranking of connection and snap suggestions.

use cadbuilder_ir::{BoundingBox, ConnectionKind, ConnectionPoint, GeometryIndex, ItemId};
use cadbuilder_math::{rotation_between, rotation_to_xyzw, Dir3, Point3, Rotation, Transform, Vec3};
use tracing::{debug, instrument};

use crate::config::PlacementConfig;
use crate::suggestion::{Suggestion, SuggestionKind};

/// One placed item as the engine sees it.
#[derive(Debug, Clone)]
pub struct PlacedItem<'a> {
    /// Item id.
    pub item: ItemId,
    /// Display name used in descriptions.
    pub name: String,
    /// World transform of the item.
    pub transform: Transform,
    /// The component's geometry; `None` while not completed.
    pub geometry: Option<&'a GeometryIndex>,
}

/// Resolved project state handed to [`suggest`], in item order.
#[derive(Debug, Clone, Default)]
pub struct AssemblySnapshot<'a> {
    /// Placed items in project order.
    pub items: Vec<PlacedItem<'a>>,
}

impl<'a> AssemblySnapshot<'a> {
    /// Snapshot over the given items.
    pub fn new(items: Vec<PlacedItem<'a>>) -> Self {
        Self { items }
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A target connection point moved into world space.
struct WorldPoint<'a> {
    point: &'a ConnectionPoint,
    position: Point3,
    normal: Dir3,
}

/// Rank placements of a candidate against the current assembly.
///
/// Connection suggestions come from every compatible pair of candidate and
/// target connection points; six snap suggestions come from each item with
/// geometry. The result is sorted by confidence, highest first, with ties in
/// evaluation order. Nothing is truncated. A candidate without completed
/// geometry gets no suggestions.
#[instrument(skip_all, fields(items = snapshot.items.len()))]
pub fn suggest(
    snapshot: &AssemblySnapshot<'_>,
    candidate: Option<&GeometryIndex>,
    config: &PlacementConfig,
) -> Vec<Suggestion> {
    let Some(candidate) = candidate else {
        debug!("candidate geometry unavailable");
        return Vec::new();
    };

    let mut out = Vec::new();
    for placed in &snapshot.items {
        let Some(geometry) = placed.geometry else {
            continue;
        };
        for target in world_points(geometry, &placed.transform) {
            for cand in candidate.connection_points() {
                if let Some(s) = connect(placed, &target, cand, config) {
                    out.push(s);
                }
            }
        }
    }
    for placed in &snapshot.items {
        if let Some(geometry) = placed.geometry {
            let world_box = geometry.bounding_box().transformed(&placed.transform);
            out.extend(snaps(placed, &world_box, candidate.bounding_box(), config));
        }
    }

    // Vec::sort_by is stable, so ties keep evaluation order.
    out.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    debug!(count = out.len(), "suggestions ranked");
    out
}

fn world_points<'a>(geometry: &'a GeometryIndex, transform: &Transform) -> Vec<WorldPoint<'a>> {
    geometry
        .connection_points()
        .iter()
        .filter_map(|point| {
            Some(WorldPoint {
                point,
                position: transform.apply_point(&point.position()),
                normal: transform.apply_dir(&point.normal())?,
            })
        })
        .collect()
}

/// Type score of a pair, or `None` when the kinds cannot mate.
pub fn type_score(candidate: &ConnectionPoint, target: &ConnectionPoint, config: &PlacementConfig) -> Option<f64> {
    if candidate.kind == target.kind {
        Some(config.exact_type_score)
    } else if candidate.accepts(target.kind) || target.accepts(candidate.kind) {
        Some(config.compatible_type_score)
    } else if candidate.kind == ConnectionKind::Custom || target.kind == ConnectionKind::Custom {
        Some(config.custom_type_score)
    } else {
        None
    }
}

/// Size score of a pair, or `None` when both diameters are known and too far apart.
pub fn size_score(candidate: &ConnectionPoint, target: &ConnectionPoint, config: &PlacementConfig) -> Option<f64> {
    let (Some(a), Some(b)) = (candidate.diameter(), target.diameter()) else {
        return Some(config.unknown_size_score);
    };
    let rel = (a - b).abs() / a.max(b);
    if rel > config.size_tolerance {
        return None;
    }
    let frac = if config.size_tolerance > 0.0 {
        rel / config.size_tolerance
    } else {
        0.0
    };
    Some(1.0 - (1.0 - config.min_size_score) * frac)
}

/// 1 for exactly opposed normals, 0 for identical ones.
pub fn normal_score(candidate: &Dir3, target: &Dir3) -> f64 {
    ((1.0 - candidate.dot(target.as_ref())) / 2.0).clamp(0.0, 1.0)
}

fn connect(
    placed: &PlacedItem<'_>,
    target: &WorldPoint<'_>,
    cand: &ConnectionPoint,
    config: &PlacementConfig,
) -> Option<Suggestion> {
    let t = type_score(cand, target.point, config)?;
    let s = size_score(cand, target.point, config)?;
    let n = normal_score(&cand.normal(), &target.normal);

    let facing = Dir3::new_unchecked(-target.normal.into_inner());
    let rotation: Rotation = rotation_between(&cand.normal(), &facing);
    let anchor = target.position.coords + target.normal.into_inner() * config.clearance;
    let position: Vec3 = anchor - rotation * cand.position().coords;

    Some(Suggestion {
        position: position.into(),
        rotation: rotation_to_xyzw(&rotation),
        kind: SuggestionKind::Connection,
        confidence: config.connection_confidence(t, s, n),
        target_item: Some(placed.item),
        target_point: Some(target.point.name.clone()),
        candidate_point: Some(cand.name.clone()),
        description: format!(
            "Connect {} to {} at {}",
            cand.name, placed.name, target.point.name
        ),
    })
}

fn snaps(
    placed: &PlacedItem<'_>,
    target: &BoundingBox,
    candidate: &BoundingBox,
    config: &PlacementConfig,
) -> Vec<Suggestion> {
    let (tmin, tmax, tc) = (target.min(), target.max(), target.center());
    let (cmin, cmax, cc) = (candidate.min(), candidate.max(), candidate.center());
    // Centered on the target; the face axis is overridden below.
    let centered = tc - cc;

    let faces = [
        (SuggestionKind::SnapTop, 2, tmax.z - cmin.z, "on top of"),
        (SuggestionKind::SnapBottom, 2, tmin.z - cmax.z, "below"),
        (SuggestionKind::SnapLeft, 0, tmin.x - cmax.x, "left of"),
        (SuggestionKind::SnapRight, 0, tmax.x - cmin.x, "right of"),
        (SuggestionKind::SnapFront, 1, tmin.y - cmax.y, "in front of"),
        (SuggestionKind::SnapBack, 1, tmax.y - cmin.y, "behind"),
    ];
    faces
        .into_iter()
        .map(|(kind, axis, offset, verb)| {
            let mut p = centered;
            p[axis] = offset;
            Suggestion {
                position: p.into(),
                rotation: rotation_to_xyzw(&Rotation::identity()),
                kind,
                confidence: config.snap_confidence,
                target_item: Some(placed.item),
                target_point: None,
                candidate_point: None,
                description: format!("Place {verb} {}", placed.name),
            }
        })
        .collect()
}
