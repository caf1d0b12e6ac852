//! Catalog entries: categories and components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CategoryId, ComponentId, GeometryIndex, IrError};

/// Lifecycle of a component's geometry extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Registered, not yet processed.
    #[default]
    Pending,
    /// Extraction in progress.
    Processing,
    /// Geometry available.
    Completed,
    /// Extraction failed; see `processing_error`.
    Failed,
}

impl ProcessingStatus {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse functional class of a component. Drives the placement rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CategoryLabel {
    /// Drive motor.
    Motor,
    /// Conveyor roller.
    Roller,
    /// Conveyor belt.
    Belt,
    /// Structural frame.
    Frame,
    /// Base plate.
    #[default]
    Base,
}

/// Placement rule attached to a [`CategoryLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRule {
    /// Faces other parts may mount on.
    pub mountable_sides: &'static [&'static str],
    /// Orientations the part may take.
    pub supported_orientations: &'static [&'static str],
    /// Labels this part is expected to attach to.
    pub compatible: &'static [CategoryLabel],
}

impl CategoryLabel {
    /// Every label in declaration order.
    pub const ALL: [CategoryLabel; 5] = [
        CategoryLabel::Motor,
        CategoryLabel::Roller,
        CategoryLabel::Belt,
        CategoryLabel::Frame,
        CategoryLabel::Base,
    ];

    /// Name as written in JSON and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLabel::Motor => "Motor",
            CategoryLabel::Roller => "Roller",
            CategoryLabel::Belt => "Belt",
            CategoryLabel::Frame => "Frame",
            CategoryLabel::Base => "Base",
        }
    }

    /// The rule applied when a component with this label finishes processing.
    pub fn placement_rule(&self) -> PlacementRule {
        const FIXED: &[&str] = &["fixed"];
        match self {
            CategoryLabel::Base => PlacementRule {
                mountable_sides: &["top"],
                supported_orientations: FIXED,
                compatible: &[CategoryLabel::Motor, CategoryLabel::Roller],
            },
            CategoryLabel::Motor | CategoryLabel::Roller => PlacementRule {
                mountable_sides: &["bottom"],
                supported_orientations: FIXED,
                compatible: &[CategoryLabel::Base],
            },
            CategoryLabel::Belt => PlacementRule {
                mountable_sides: &["top"],
                supported_orientations: FIXED,
                compatible: &[CategoryLabel::Roller],
            },
            CategoryLabel::Frame => PlacementRule {
                mountable_sides: &["top", "bottom"],
                supported_orientations: FIXED,
                compatible: &[CategoryLabel::Base],
            },
        }
    }
}

impl std::fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CategoryLabel {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryLabel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| IrError::UnknownLabel(s.to_string()))
    }
}

/// A named grouping of components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique id.
    pub id: CategoryId,
    /// Unique name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Icon name for front ends.
    #[serde(default)]
    pub icon: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A reusable part definition backed by a 3D file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique id.
    pub id: ComponentId,
    /// Display name.
    pub name: String,
    /// Optional catalog category.
    #[serde(default)]
    pub category: Option<CategoryId>,
    /// Functional class.
    #[serde(default)]
    pub category_label: CategoryLabel,
    /// Path of the uploaded source file.
    pub source_file: String,
    /// Path of a converted GLB, when the source needed conversion.
    #[serde(default)]
    pub glb_file: Option<String>,
    /// Extraction status.
    #[serde(default)]
    pub status: ProcessingStatus,
    /// Failure message from the last extraction attempt.
    #[serde(default)]
    pub processing_error: Option<String>,
    #[serde(default)]
    geometry: Option<GeometryIndex>,
    /// Faces other parts may mount on.
    #[serde(default)]
    pub mountable_sides: Vec<String>,
    /// Orientations this part may take.
    #[serde(default)]
    pub supported_orientations: Vec<String>,
    /// Labels this part attaches to.
    #[serde(default)]
    pub compatible_types: Vec<CategoryLabel>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Component {
    /// A freshly registered component with status pending.
    pub fn new(id: ComponentId, name: impl Into<String>, source_file: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            category: None,
            category_label: CategoryLabel::default(),
            source_file: source_file.into(),
            glb_file: None,
            status: ProcessingStatus::Pending,
            processing_error: None,
            geometry: None,
            mountable_sides: Vec::new(),
            supported_orientations: Vec::new(),
            compatible_types: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The geometry index, available only once processing completed.
    pub fn geometry(&self) -> Option<&GeometryIndex> {
        match self.status {
            ProcessingStatus::Completed => self.geometry.as_ref(),
            _ => None,
        }
    }

    /// Whether extraction finished successfully.
    pub fn is_completed(&self) -> bool {
        self.status == ProcessingStatus::Completed
    }

    /// Enter the processing state.
    pub fn mark_processing(&mut self) {
        self.status = ProcessingStatus::Processing;
        self.processing_error = None;
        self.touch();
    }

    /// Store extracted geometry and fill the placement rule fields from the label.
    pub fn complete(&mut self, geometry: GeometryIndex) {
        let rule = self.category_label.placement_rule();
        self.mountable_sides = rule.mountable_sides.iter().map(|s| s.to_string()).collect();
        self.supported_orientations = rule
            .supported_orientations
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.compatible_types = rule.compatible.to_vec();
        self.geometry = Some(geometry);
        self.status = ProcessingStatus::Completed;
        self.processing_error = None;
        self.touch();
    }

    /// Record a failed extraction; any previous geometry is dropped.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.geometry = None;
        self.status = ProcessingStatus::Failed;
        self.processing_error = Some(error.into());
        self.touch();
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// File extraction should read: the converted GLB when present.
    pub fn geometry_source(&self) -> &str {
        self.glb_file.as_deref().unwrap_or(&self.source_file)
    }
}
