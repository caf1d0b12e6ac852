/// Scoring thresholds and weights for the suggestion engine.
///
/// These are compiled-in heuristics; callers pass them explicitly so tests
/// can vary them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConfig {
    /// Gap left between mated connection points, along the target normal.
    pub clearance: f64,
    /// Largest accepted relative diameter difference, `|a - b| / max(a, b)`.
    pub size_tolerance: f64,
    /// Type score for identical kinds.
    pub exact_type_score: f64,
    /// Type score when one point lists the other's kind as compatible.
    pub compatible_type_score: f64,
    /// Type score when either side is `custom`.
    pub custom_type_score: f64,
    /// Size score at the tolerance limit; exact matches score 1.
    pub min_size_score: f64,
    /// Size score when either diameter is unspecified.
    pub unknown_size_score: f64,
    /// Weight of the type score in the blend.
    pub type_weight: f64,
    /// Weight of the size score in the blend.
    pub size_weight: f64,
    /// Weight of the normal-opposition score in the blend.
    pub normal_weight: f64,
    /// Lowest confidence a connection can get. Keeps connections above snaps.
    pub connection_floor: f64,
    /// Confidence of every snap suggestion.
    pub snap_confidence: f64,
}

impl PlacementConfig {
    /// Default heuristics.
    pub const DEFAULT: Self = Self {
        clearance: 0.0,
        size_tolerance: 0.1,
        exact_type_score: 1.0,
        compatible_type_score: 0.6,
        custom_type_score: 0.5,
        min_size_score: 0.5,
        unknown_size_score: 0.75,
        type_weight: 0.4,
        size_weight: 0.2,
        normal_weight: 0.4,
        connection_floor: 0.6,
        snap_confidence: 0.5,
    };

    /// Same heuristics with a different clearance.
    pub fn with_clearance(self, clearance: f64) -> Self {
        Self { clearance, ..self }
    }

    /// Map the blended pair score in [0, 1] onto `[connection_floor, 1]`.
    pub fn connection_confidence(&self, type_score: f64, size_score: f64, normal_score: f64) -> f64 {
        let total = self.type_weight + self.size_weight + self.normal_weight;
        let blend = if total > 0.0 {
            (self.type_weight * type_score
                + self.size_weight * size_score
                + self.normal_weight * normal_score)
                / total
        } else {
            0.0
        };
        (self.connection_floor + (1.0 - self.connection_floor) * blend).clamp(0.0, 1.0)
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
