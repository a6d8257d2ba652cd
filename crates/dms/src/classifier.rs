//! Per-frame drowsiness classification strategies
//!
//! Two policies share one interface:
//! - [`ThresholdClassifier`] maps the averaged EAR straight to a label and
//!   never reads or writes the session.
//! - [`HysteresisClassifier`] maps each eye to an openness level and keeps
//!   consecutive-frame counters in the [`SubjectSession`].

use landmarks::average_ear;
use serde::{Deserialize, Serialize};

use crate::config::{ClassificationMode, DmsConfig, EarThresholds, OpennessThresholds};
use crate::state::{DrowsinessLabel, EyeOpenness, SubjectSession};

/// What the geometry stage saw in one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The detector found no face
    NoFace,
    /// Per-eye aspect ratios
    Eyes { left_ear: f32, right_ear: f32 },
}

/// Outcome of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: DrowsinessLabel,
    /// Per-eye openness levels, when the strategy computes them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openness: Option<(EyeOpenness, EyeOpenness)>,
}

/// Common interface of the classification policies
pub trait ClassificationStrategy {
    /// Classify one frame, updating `session` if the policy is stateful
    fn classify(&self, observation: &Observation, session: &mut SubjectSession) -> Classification;
}

/// Stateless thresholding of the averaged EAR
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdClassifier {
    thresholds: EarThresholds,
}

impl ThresholdClassifier {
    pub fn new(thresholds: EarThresholds) -> Self {
        Self { thresholds }
    }

    /// Label for an averaged EAR; both cutoffs are strict less-than
    pub fn classify_ear(&self, average: f32) -> DrowsinessLabel {
        if average < self.thresholds.low {
            DrowsinessLabel::Sleeping
        } else if average < self.thresholds.mid {
            DrowsinessLabel::Dizzy
        } else {
            DrowsinessLabel::Active
        }
    }
}

impl ClassificationStrategy for ThresholdClassifier {
    fn classify(&self, observation: &Observation, _session: &mut SubjectSession) -> Classification {
        let label = match *observation {
            Observation::NoFace => DrowsinessLabel::NoFaceDetected,
            Observation::Eyes { left_ear, right_ear } => {
                self.classify_ear(average_ear(left_ear, right_ear))
            }
        };
        Classification {
            label,
            openness: None,
        }
    }
}

/// Consecutive-frame hysteresis over per-eye openness levels
#[derive(Debug, Clone, Copy)]
pub struct HysteresisClassifier {
    thresholds: OpennessThresholds,
    min_drowsy_frames: u32,
}

impl Default for HysteresisClassifier {
    fn default() -> Self {
        Self::new(OpennessThresholds::default(), 2)
    }
}

impl HysteresisClassifier {
    pub fn new(thresholds: OpennessThresholds, min_drowsy_frames: u32) -> Self {
        Self {
            thresholds,
            min_drowsy_frames: min_drowsy_frames.max(1),
        }
    }

    pub fn thresholds(&self) -> &OpennessThresholds {
        &self.thresholds
    }

    /// Advance the session by one frame of per-eye openness levels
    pub fn step(
        &self,
        left: EyeOpenness,
        right: EyeOpenness,
        session: &mut SubjectSession,
    ) -> DrowsinessLabel {
        match (left, right) {
            (EyeOpenness::Partial, EyeOpenness::Partial) => {
                // The first borderline frames keep the previous label
                if session.record_drowsy() >= self.min_drowsy_frames {
                    session.label = DrowsinessLabel::Dizzy;
                }
            }
            (EyeOpenness::Closed, EyeOpenness::Closed) => {
                session.record_closed();
                session.label = DrowsinessLabel::Sleeping;
            }
            (EyeOpenness::Open, EyeOpenness::Open) => {
                session.record_active();
                session.label = DrowsinessLabel::Active;
            }
            // Mixed levels: counters keep their progress
            _ => {
                session.label = DrowsinessLabel::Unknown;
            }
        }
        session.label
    }
}

impl ClassificationStrategy for HysteresisClassifier {
    fn classify(&self, observation: &Observation, session: &mut SubjectSession) -> Classification {
        match *observation {
            // A detection miss leaves counters and the last label alone
            Observation::NoFace => Classification {
                label: DrowsinessLabel::NoFaceDetected,
                openness: None,
            },
            Observation::Eyes { left_ear, right_ear } => {
                let left = self.thresholds.level(left_ear);
                let right = self.thresholds.level(right_ear);
                Classification {
                    label: self.step(left, right, session),
                    openness: Some((left, right)),
                }
            }
        }
    }
}

/// Classification policy selected by configuration
#[derive(Debug, Clone, Copy)]
pub enum Classifier {
    Threshold(ThresholdClassifier),
    Hysteresis(HysteresisClassifier),
}

impl Classifier {
    pub fn from_config(config: &DmsConfig) -> Self {
        match config.mode {
            ClassificationMode::Threshold => {
                Classifier::Threshold(ThresholdClassifier::new(config.ear_thresholds))
            }
            ClassificationMode::Hysteresis => Classifier::Hysteresis(HysteresisClassifier::new(
                config.openness_thresholds,
                config.min_drowsy_frames,
            )),
        }
    }

    pub fn mode(&self) -> ClassificationMode {
        match self {
            Classifier::Threshold(_) => ClassificationMode::Threshold,
            Classifier::Hysteresis(_) => ClassificationMode::Hysteresis,
        }
    }
}

impl ClassificationStrategy for Classifier {
    fn classify(&self, observation: &Observation, session: &mut SubjectSession) -> Classification {
        match self {
            Classifier::Threshold(c) => c.classify(observation, session),
            Classifier::Hysteresis(c) => c.classify(observation, session),
        }
    }
}
