//! Error type shared by every stage of the text → splat pipeline.

use thiserror::Error;

/// Errors that terminate a generation run.
///
/// Font problems are deliberately absent: a font that cannot be loaded
/// degrades to the built-in rasterizer (see [`crate::glyph::FontLoadDegraded`]).
#[derive(Debug, Error)]
pub enum SplatError {
    /// Rasterization produced no pixel above the coverage threshold.
    #[error("no pixels obtained from rasterized text; check font and text")]
    EmptyGeometry,

    /// Per-point attribute arrays disagree on the point count.
    #[error("{field} length mismatch: got {got}, expected {expected}")]
    InvalidGeometry {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes do not follow the fixed splat PLY schema.
    #[error("invalid splat PLY: {0}")]
    InvalidFormat(String),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// A numeric tunable is non-finite or outside its range.
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),
}

impl SplatError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        SplatError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
