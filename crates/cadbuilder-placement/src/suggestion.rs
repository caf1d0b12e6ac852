use cadbuilder_assembly::NewItem;
use cadbuilder_ir::{ComponentId, ItemId};
use cadbuilder_math::{MathError, Pose};
use serde::{Deserialize, Serialize};

/// What produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A candidate connection point mated to a target connection point.
    Connection,
    /// Resting on the target's top face.
    SnapTop,
    /// Hanging under the target's bottom face.
    SnapBottom,
    /// Against the target's -X face.
    SnapLeft,
    /// Against the target's +X face.
    SnapRight,
    /// Against the target's -Y face.
    SnapFront,
    /// Against the target's +Y face.
    SnapBack,
}

impl SuggestionKind {
    /// Snap kinds in evaluation order.
    pub const SNAPS: [SuggestionKind; 6] = [
        SuggestionKind::SnapTop,
        SuggestionKind::SnapBottom,
        SuggestionKind::SnapLeft,
        SuggestionKind::SnapRight,
        SuggestionKind::SnapFront,
        SuggestionKind::SnapBack,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Connection => "connection",
            SuggestionKind::SnapTop => "snap_top",
            SuggestionKind::SnapBottom => "snap_bottom",
            SuggestionKind::SnapLeft => "snap_left",
            SuggestionKind::SnapRight => "snap_right",
            SuggestionKind::SnapFront => "snap_front",
            SuggestionKind::SnapBack => "snap_back",
        }
    }

    /// Whether this is one of the six snap kinds.
    pub fn is_snap(&self) -> bool {
        !matches!(self, SuggestionKind::Connection)
    }
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed placement for the candidate component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// World position of the candidate's local origin.
    pub position: [f64; 3],
    /// World rotation `[x, y, z, w]`.
    pub rotation: [f64; 4],
    /// Producer of the suggestion.
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// Heuristic score in [0, 1].
    pub confidence: f64,
    /// Item the suggestion attaches to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_item: Option<ItemId>,
    /// Connection point on the target item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_point: Option<String>,
    /// Connection point on the candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_point: Option<String>,
    /// Human-readable summary.
    pub description: String,
}

impl Suggestion {
    /// The pose this suggestion proposes, at unit scale.
    pub fn pose(&self) -> Result<Pose, MathError> {
        Pose::new(self.position, self.rotation, [1.0, 1.0, 1.0])
    }

    /// Turn an accepted suggestion into an item creation request.
    ///
    /// Connection suggestions record the target item and point. The new item
    /// is placed at the project root since the pose is already in world space.
    pub fn to_new_item(&self, component: ComponentId) -> Result<NewItem, MathError> {
        let (connected_to, attached_at_point) = match self.kind {
            SuggestionKind::Connection => (self.target_item, self.target_point.clone()),
            _ => (None, None),
        };
        Ok(NewItem {
            pose: self.pose()?,
            connected_to,
            attached_at_point,
            ..NewItem::new(component)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Suggestion {
        Suggestion {
            position: [0.0, 0.0, 10.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            kind: SuggestionKind::Connection,
            confidence: 0.98,
            target_item: Some(3),
            target_point: Some("top".into()),
            candidate_point: Some("bottom".into()),
            description: "Connect bottom to plate at top".into(),
        }
    }

    #[test]
    fn kind_wire_names() {
        let json = serde_json::to_string(&SuggestionKind::SnapFront).unwrap();
        assert_eq!(json, r#""snap_front""#);
        for kind in SuggestionKind::SNAPS {
            assert!(kind.is_snap());
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{kind}\""));
        }
        assert!(!SuggestionKind::Connection.is_snap());
    }

    #[test]
    fn serializes_kind_as_type() {
        let v = serde_json::to_value(connection()).unwrap();
        assert_eq!(v["type"], "connection");
        assert_eq!(v["target_item"], 3);
        assert_eq!(v["position"][2], 10.0);
    }

    #[test]
    fn connection_to_new_item_records_link() {
        let item = connection().to_new_item(9).unwrap();
        assert_eq!(item.component, 9);
        assert_eq!(item.connected_to, Some(3));
        assert_eq!(item.attached_at_point.as_deref(), Some("top"));
        assert_eq!(item.parent, None);
        assert_eq!(item.pose, Pose::at([0.0, 0.0, 10.0]).unwrap());
    }

    #[test]
    fn snap_to_new_item_has_no_link() {
        let snap = Suggestion {
            kind: SuggestionKind::SnapTop,
            target_point: None,
            candidate_point: None,
            ..connection()
        };
        let item = snap.to_new_item(9).unwrap();
        assert_eq!(item.connected_to, None);
        assert_eq!(item.attached_at_point, None);
    }
}
