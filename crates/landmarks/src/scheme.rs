//! Landmark index schemes and eye index maps

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Fixed anatomical indexing scheme of a landmark detector backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LandmarkScheme {
    /// dlib-style 68 point layout
    #[serde(rename = "dlib68")]
    Dlib68,
    /// MediaPipe face mesh (468 points, 478 with refined iris landmarks)
    #[default]
    #[serde(rename = "mediapipe468", alias = "mediapipe")]
    MediaPipe468,
}

impl LandmarkScheme {
    /// Number of points the backend emits without refinement
    pub fn point_count(self) -> usize {
        match self {
            LandmarkScheme::Dlib68 => 68,
            LandmarkScheme::MediaPipe468 => 468,
        }
    }

    /// Default eye index maps for this scheme
    pub fn eye_maps(self) -> EyeIndexPair {
        match self {
            LandmarkScheme::Dlib68 => EyeIndexPair {
                left: EyeIndexMap([42, 43, 44, 45, 46, 47]),
                right: EyeIndexMap([36, 37, 38, 39, 40, 41]),
            },
            LandmarkScheme::MediaPipe468 => EyeIndexPair {
                left: EyeIndexMap([362, 385, 387, 263, 373, 380]),
                right: EyeIndexMap([33, 160, 158, 133, 153, 144]),
            },
        }
    }
}

/// Indices of the six eye landmarks, ordered p1..p6
///
/// p1/p4 are the horizontal corners, p2/p3 the upper lid and p5/p6 the
/// lower lid, so that p2 faces p6 and p3 faces p5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeIndexMap(pub [usize; 6]);

impl EyeIndexMap {
    /// Largest landmark index referenced by this map
    pub fn max_index(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Fail with `OutOfRange` if a set of `available` points cannot satisfy this map
    pub fn check_bounds(&self, available: usize) -> Result<(), GeometryError> {
        let index = self.max_index();
        if index >= available {
            Err(GeometryError::OutOfRange { index, available })
        } else {
            Ok(())
        }
    }
}

/// Index maps for both eyes of one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeIndexPair {
    pub left: EyeIndexMap,
    pub right: EyeIndexMap,
}

impl EyeIndexPair {
    /// Minimum number of landmarks a set must carry for both eyes
    pub fn required_points(&self) -> usize {
        self.left.max_index().max(self.right.max_index()) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_maps_fit_scheme() {
        for scheme in [LandmarkScheme::Dlib68, LandmarkScheme::MediaPipe468] {
            let maps = scheme.eye_maps();
            assert!(maps.required_points() <= scheme.point_count());
        }
    }

    #[test]
    fn test_check_bounds() {
        let map = LandmarkScheme::MediaPipe468.eye_maps().left;
        assert_eq!(map.max_index(), 387);
        assert!(map.check_bounds(468).is_ok());
        assert_eq!(
            map.check_bounds(68),
            Err(GeometryError::OutOfRange { index: 387, available: 68 })
        );
    }

    #[test]
    fn test_scheme_serde_names() {
        let json = serde_json::to_string(&LandmarkScheme::MediaPipe468).unwrap();
        assert_eq!(json, "\"mediapipe468\"");
        let scheme: LandmarkScheme = serde_json::from_str("\"dlib68\"").unwrap();
        assert_eq!(scheme, LandmarkScheme::Dlib68);
        let scheme: LandmarkScheme = serde_json::from_str("\"mediapipe\"").unwrap();
        assert_eq!(scheme, LandmarkScheme::MediaPipe468);
    }
}
