//! Landmark Geometry
//!
//! Selects the six landmarks describing each eye from a per-frame facial
//! landmark set and computes the Eye Aspect Ratio (EAR).
//!
//! All operations are pure functions of one frame's landmarks.

mod ear;
mod error;
mod scheme;
mod set;

pub use ear::{average_ear, compute_ear, extract_eyes, EyeMeasurement, EyePair, DEFAULT_EPSILON};
pub use error::GeometryError;
pub use scheme::{EyeIndexMap, EyeIndexPair, LandmarkScheme};
pub use set::{EyeLandmarks, LandmarkSet, Point};
