//! Error types for the data model.

use cadbuilder_math::MathError;
use thiserror::Error;

/// Errors raised when building or decoding model values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    /// A raw vector, normal or quaternion was rejected.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Bounding box with `min > max` on some axis.
    #[error("inverted bounding box: min {min:?} exceeds max {max:?}")]
    InvertedBounds {
        /// Requested minimum corner.
        min: [f64; 3],
        /// Requested maximum corner.
        max: [f64; 3],
    },

    /// Volume is negative or not finite.
    #[error("volume must be finite and non-negative, got {0}")]
    InvalidVolume(f64),

    /// Unknown category label.
    #[error("unknown category label '{0}'")]
    UnknownLabel(String),
}
