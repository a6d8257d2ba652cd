//! Eye Aspect Ratio computation

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::scheme::{EyeIndexMap, EyeIndexPair};
use crate::set::{EyeLandmarks, LandmarkSet};

/// Default minimum eye width, in landmark coordinate units
pub const DEFAULT_EPSILON: f32 = 1e-6;

/// Compute the EAR of the eye selected by `map`
///
/// Fails with `OutOfRange` when the set is too short for the map, with
/// `DegenerateGeometry` when the horizontal eye width is below `epsilon` and
/// with `NonFiniteRatio` when the distances overflow.
pub fn compute_ear(
    landmarks: &LandmarkSet,
    map: &EyeIndexMap,
    epsilon: f32,
) -> Result<f32, GeometryError> {
    landmarks.eye(map)?.aspect_ratio(epsilon)
}

/// Mean of the two per-eye ratios
pub fn average_ear(left: f32, right: f32) -> f32 {
    (left + right) / 2.0
}

/// One eye's landmarks and ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeMeasurement {
    pub landmarks: EyeLandmarks,
    pub ear: f32,
}

/// Both eyes of one subject in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePair {
    pub left: EyeMeasurement,
    pub right: EyeMeasurement,
}

impl EyePair {
    pub fn average_ear(&self) -> f32 {
        average_ear(self.left.ear, self.right.ear)
    }
}

/// Select both eyes and compute their ratios
pub fn extract_eyes(
    landmarks: &LandmarkSet,
    maps: &EyeIndexPair,
    epsilon: f32,
) -> Result<EyePair, GeometryError> {
    let measure = |map: &EyeIndexMap| -> Result<EyeMeasurement, GeometryError> {
        let eye = landmarks.eye(map)?;
        Ok(EyeMeasurement {
            ear: eye.aspect_ratio(epsilon)?,
            landmarks: eye,
        })
    };

    Ok(EyePair {
        left: measure(&maps.left)?,
        right: measure(&maps.right)?,
    })
}
