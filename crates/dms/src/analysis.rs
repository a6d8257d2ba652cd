//! DMS analysis results

use landmarks::EyePair;
use serde::{Deserialize, Serialize};

use crate::state::{DrowsinessLabel, EyeOpenness, SubjectSession};

/// Complete per-frame analysis result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Classification for this frame
    pub label: DrowsinessLabel,

    /// Whether a face was detected
    pub face_detected: bool,

    /// Eye landmarks and per-eye EAR (points are passed through for overlays)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eyes: Option<EyePair>,

    /// Mean of the two per-eye ratios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_ear: Option<f32>,

    /// Per-eye openness levels (hysteresis mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openness: Option<(EyeOpenness, EyeOpenness)>,

    /// Fraction of recent samples below the sleeping cutoff
    pub perclos: f32,

    /// SLEEPING has persisted for the configured duration
    pub sustained_sleep: bool,

    /// Session counters after this frame
    pub session: SubjectSession,
}

impl FrameAnalysis {
    pub fn left_ear(&self) -> Option<f32> {
        self.eyes.map(|e| e.left.ear)
    }

    pub fn right_ear(&self) -> Option<f32> {
        self.eyes.map(|e| e.right.ear)
    }

    /// Check if this frame should raise an alert
    pub fn is_alert(&self) -> bool {
        self.label.is_alert()
    }

    pub fn status_text(&self) -> &'static str {
        self.label.status_text()
    }
}
