//! Geometry Error Types

use thiserror::Error;

/// Errors while extracting eye geometry from a landmark set
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Eye index map references a landmark the set does not contain
    #[error("landmark index {index} is out of range ({available} points available)")]
    OutOfRange { index: usize, available: usize },

    /// Horizontal eye width is too small to divide by
    #[error("degenerate eye geometry: horizontal width {width} is below epsilon {epsilon}")]
    DegenerateGeometry { width: f32, epsilon: f32 },

    /// A selected landmark has a NaN or infinite coordinate
    #[error("landmark {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    /// Finite landmarks whose distances overflow f32
    #[error("eye aspect ratio is not finite (vertical {vertical}, horizontal {width})")]
    NonFiniteRatio { vertical: f32, width: f32 },
}
