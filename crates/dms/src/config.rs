//! DMS configuration

use landmarks::{EyeIndexPair, DEFAULT_EPSILON};
use serde::{Deserialize, Serialize};

use crate::state::EyeOpenness;
use crate::DmsError;

/// Classification policy applied to each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Stateless thresholding of the averaged EAR
    #[default]
    Threshold,
    /// Per-eye openness levels with consecutive-frame hysteresis
    Hysteresis,
}

/// Averaged-EAR cutoffs for threshold mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarThresholds {
    /// Below this the subject is sleeping
    pub low: f32,
    /// Below this (and at or above `low`) the subject is dizzy
    pub mid: f32,
}

impl Default for EarThresholds {
    fn default() -> Self {
        Self { low: 0.20, mid: 0.25 }
    }
}

/// Per-eye EAR cutoffs for hysteresis mode
///
/// Higher EAR means a more open eye, the same polarity as threshold mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpennessThresholds {
    /// At or below this the eye is closed
    pub closed: f32,
    /// At or below this (and above `closed`) the eye is partially open
    pub partial: f32,
}

impl Default for OpennessThresholds {
    fn default() -> Self {
        Self {
            closed: 0.21,
            partial: 0.25,
        }
    }
}

impl OpennessThresholds {
    /// Openness level of one eye
    pub fn level(&self, ear: f32) -> EyeOpenness {
        if ear > self.partial {
            EyeOpenness::Open
        } else if ear > self.closed {
            EyeOpenness::Partial
        } else {
            EyeOpenness::Closed
        }
    }
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Classification policy
    pub mode: ClassificationMode,

    /// Eye index maps overriding the landmark scheme's defaults
    pub eye_maps: Option<EyeIndexPair>,

    /// Threshold mode cutoffs
    pub ear_thresholds: EarThresholds,

    /// Hysteresis mode cutoffs
    pub openness_thresholds: OpennessThresholds,

    /// Consecutive partially-open frames before DIZZY is emitted
    pub min_drowsy_frames: u32,

    /// Minimum eye width before geometry is considered degenerate
    pub degenerate_epsilon: f32,

    /// Expected interval between frames (milliseconds)
    pub frame_interval_ms: u64,

    /// Sleeping run length that counts as sustained sleep (milliseconds)
    pub sustained_sleep_ms: u64,

    /// Samples kept for PERCLOS
    pub perclos_window: usize,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            mode: ClassificationMode::default(),
            eye_maps: None,
            ear_thresholds: EarThresholds::default(),
            openness_thresholds: OpennessThresholds::default(),
            min_drowsy_frames: 2,
            degenerate_epsilon: DEFAULT_EPSILON,
            frame_interval_ms: 33, // ~30fps
            sustained_sleep_ms: 5000,
            perclos_window: 900,
        }
    }
}

impl DmsConfig {
    /// Create strict config (earlier warnings)
    pub fn strict() -> Self {
        Self {
            ear_thresholds: EarThresholds { low: 0.22, mid: 0.28 },
            min_drowsy_frames: 1,
            sustained_sleep_ms: 3000,
            ..Default::default()
        }
    }

    /// Create lenient config (fewer false alarms)
    pub fn lenient() -> Self {
        Self {
            ear_thresholds: EarThresholds { low: 0.18, mid: 0.22 },
            min_drowsy_frames: 4,
            sustained_sleep_ms: 8000,
            ..Default::default()
        }
    }

    /// Hysteresis mode with otherwise default settings
    pub fn hysteresis() -> Self {
        Self {
            mode: ClassificationMode::Hysteresis,
            ..Default::default()
        }
    }

    /// Reject settings that would make classification meaningless
    pub fn validate(&self) -> Result<(), DmsError> {
        let EarThresholds { low, mid } = self.ear_thresholds;
        if !(low.is_finite() && mid.is_finite() && 0.0 < low && low < mid) {
            return Err(DmsError::Config(format!(
                "ear thresholds must satisfy 0 < low < mid (low={low}, mid={mid})"
            )));
        }

        let OpennessThresholds { closed, partial } = self.openness_thresholds;
        if !(closed.is_finite() && partial.is_finite() && 0.0 < closed && closed < partial) {
            return Err(DmsError::Config(format!(
                "openness thresholds must satisfy 0 < closed < partial (closed={closed}, partial={partial})"
            )));
        }

        if self.min_drowsy_frames == 0 {
            return Err(DmsError::Config("min_drowsy_frames must be at least 1".into()));
        }

        if !(self.degenerate_epsilon.is_finite() && self.degenerate_epsilon > 0.0) {
            return Err(DmsError::Config(format!(
                "degenerate_epsilon must be positive (got {})",
                self.degenerate_epsilon
            )));
        }

        if self.frame_interval_ms == 0 {
            return Err(DmsError::Config("frame_interval_ms must be positive".into()));
        }

        if self.perclos_window == 0 {
            return Err(DmsError::Config("perclos_window must be positive".into()));
        }

        Ok(())
    }
}
