//! Landmark detection seam
//!
//! Face detection and landmark inference run outside this crate. A
//! detector is constructed by the caller and handed to the monitor per
//! frame, so each pipeline owns its own instance.

use landmarks::{LandmarkScheme, LandmarkSet, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DmsError;

/// Produces a landmark set for one frame
pub trait LandmarkDetector {
    /// Input the detector consumes (image, pre-computed record, ...)
    type Frame;

    /// Index scheme of the landmarks this detector emits
    fn scheme(&self) -> LandmarkScheme;

    /// Landmarks of the first face in `frame`, or `None` when no face is visible
    fn detect(&mut self, frame: &Self::Frame) -> Result<Option<LandmarkSet>, DmsError>;
}

/// Pre-computed landmarks for one frame of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monitored subject the frame belongs to
    pub subject: String,
    /// Frame sequence number
    #[serde(default)]
    pub sequence: u64,
    /// Capture timestamp (milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// Index scheme of `landmarks`; the detector's scheme when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<LandmarkScheme>,
    /// Face landmarks, absent when no face was detected
    #[serde(default)]
    pub landmarks: Option<Vec<Point>>,
}

/// Detector that replays landmarks recorded by an upstream backend
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    scheme: LandmarkScheme,
    frames_seen: u64,
}

impl ReplayDetector {
    pub fn new(scheme: LandmarkScheme) -> Self {
        Self {
            scheme,
            frames_seen: 0,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl LandmarkDetector for ReplayDetector {
    type Frame = LandmarkFrame;

    fn scheme(&self) -> LandmarkScheme {
        self.scheme
    }

    fn detect(&mut self, frame: &LandmarkFrame) -> Result<Option<LandmarkSet>, DmsError> {
        self.frames_seen += 1;

        let scheme = frame.scheme.unwrap_or(self.scheme);
        if scheme != self.scheme {
            return Err(DmsError::Detector(format!(
                "frame {} of {} uses {:?} landmarks, detector expects {:?}",
                frame.sequence, frame.subject, scheme, self.scheme
            )));
        }

        match &frame.landmarks {
            Some(points) if !points.is_empty() => {
                Ok(Some(LandmarkSet::new(scheme, points.clone())))
            }
            _ => {
                debug!("No face in frame {} of {}", frame.sequence, frame.subject);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(landmarks: Option<Vec<Point>>) -> LandmarkFrame {
        LandmarkFrame {
            subject: "driver-1".into(),
            sequence: 7,
            timestamp_ms: None,
            scheme: None,
            landmarks,
        }
    }

    #[test]
    fn test_replay_passes_landmarks_through() {
        let mut detector = ReplayDetector::new(LandmarkScheme::Dlib68);
        let set = detector
            .detect(&frame(Some(vec![Point::new(1.0, 2.0); 68])))
            .unwrap()
            .unwrap();
        assert_eq!(set.scheme, LandmarkScheme::Dlib68);
        assert_eq!(set.len(), 68);
        assert_eq!(detector.frames_seen(), 1);
    }

    #[test]
    fn test_replay_missing_or_empty_is_no_face() {
        let mut detector = ReplayDetector::new(LandmarkScheme::Dlib68);
        assert!(detector.detect(&frame(None)).unwrap().is_none());
        assert!(detector.detect(&frame(Some(vec![]))).unwrap().is_none());
    }

    #[test]
    fn test_replay_rejects_other_scheme() {
        let mut detector = ReplayDetector::new(LandmarkScheme::Dlib68);
        let mut f = frame(Some(vec![Point::default(); 468]));
        f.scheme = Some(LandmarkScheme::MediaPipe468);
        assert!(matches!(detector.detect(&f), Err(DmsError::Detector(_))));
    }

    #[test]
    fn test_frame_parses_from_json() {
        let f: LandmarkFrame = serde_json::from_str(
            r#"{"subject": "a", "sequence": 3, "landmarks": [[1.0, 2.0], [3.0, 4.0]]}"#,
        )
        .unwrap();
        assert_eq!(f.sequence, 3);
        assert_eq!(f.landmarks.unwrap()[1], Point::new(3.0, 4.0));

        let f: LandmarkFrame = serde_json::from_str(r#"{"subject": "a"}"#).unwrap();
        assert!(f.landmarks.is_none());
    }
}
