//! Driver Monitoring System (DMS)
//!
//! Per-subject drowsiness classification from facial landmarks:
//! - Eye Aspect Ratio per eye and averaged
//! - Stateless threshold or stateful hysteresis classification
//! - Sustained-sleep duration gate
//! - PERCLOS over a sliding window

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod gate;
pub mod state;

pub use analysis::FrameAnalysis;
pub use classifier::{
    Classification, ClassificationStrategy, Classifier, HysteresisClassifier, Observation,
    ThresholdClassifier,
};
pub use config::{ClassificationMode, DmsConfig, EarThresholds, OpennessThresholds};
pub use detector::{LandmarkDetector, LandmarkFrame, ReplayDetector};
pub use gate::SleepDurationGate;
pub use state::{DrowsinessLabel, EyeOpenness, PerclosWindow, SubjectSession};

use landmarks::{extract_eyes, GeometryError, LandmarkSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Landmark detection failed: {0}")]
    Detector(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Drowsiness monitor for one subject
///
/// Frames must be fed in arrival order. Errors are per-frame: the session
/// is left untouched and the next frame can be processed normally.
pub struct DrowsinessMonitor {
    config: DmsConfig,
    classifier: Classifier,
    session: SubjectSession,
    perclos: PerclosWindow,
    sleep_gate: SleepDurationGate,
}

impl DrowsinessMonitor {
    /// Create a new monitor with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            "Creating drowsiness monitor: mode={:?}, min_drowsy_frames={}",
            config.mode, config.min_drowsy_frames
        );

        Ok(Self {
            classifier: Classifier::from_config(&config),
            session: SubjectSession::new(),
            perclos: PerclosWindow::new(config.perclos_window, config.ear_thresholds.low),
            sleep_gate: SleepDurationGate::from_config(&config),
            config,
        })
    }

    /// Run `detector` on `frame` and classify the result
    pub fn analyze_frame<D: LandmarkDetector>(
        &mut self,
        detector: &mut D,
        frame: &D::Frame,
    ) -> Result<FrameAnalysis, DmsError> {
        let landmarks = detector.detect(frame)?;
        self.analyze_landmarks(landmarks.as_ref())
    }

    /// Classify one frame's landmarks (`None` when no face was detected)
    pub fn analyze_landmarks(
        &mut self,
        landmarks: Option<&LandmarkSet>,
    ) -> Result<FrameAnalysis, DmsError> {
        let eyes = match landmarks {
            Some(set) => {
                let maps = self.config.eye_maps.unwrap_or_else(|| set.scheme.eye_maps());
                match extract_eyes(set, &maps, self.config.degenerate_epsilon) {
                    Ok(eyes) => Some(eyes),
                    Err(e) => {
                        warn!("Skipping frame: {}", e);
                        metrics::counter!("dms_geometry_errors_total").increment(1);
                        return Err(e.into());
                    }
                }
            }
            None => None,
        };

        let observation = match &eyes {
            Some(pair) => Observation::Eyes {
                left_ear: pair.left.ear,
                right_ear: pair.right.ear,
            },
            None => Observation::NoFace,
        };

        let classification = self.classifier.classify(&observation, &mut self.session);
        let average_ear = eyes.as_ref().map(|pair| pair.average_ear());
        if let Some(ear) = average_ear {
            self.perclos.push(ear);
        }
        let sustained_sleep = self.sleep_gate.observe(classification.label);

        debug!(
            "Frame classified: label={}, average_ear={:?}, session={:?}",
            classification.label, average_ear, self.session
        );
        metrics::counter!("dms_frames_total", "label" => classification.label.as_str())
            .increment(1);

        Ok(FrameAnalysis {
            label: classification.label,
            face_detected: eyes.is_some(),
            eyes,
            average_ear,
            openness: classification.openness,
            perclos: self.perclos.perclos(),
            sustained_sleep,
            session: self.session.clone(),
        })
    }

    /// Advance the hysteresis tracker with externally computed openness levels
    pub fn observe_openness(
        &mut self,
        left: EyeOpenness,
        right: EyeOpenness,
    ) -> Result<DrowsinessLabel, DmsError> {
        match &self.classifier {
            Classifier::Hysteresis(c) => {
                let label = c.step(left, right, &mut self.session);
                self.sleep_gate.observe(label);
                Ok(label)
            }
            Classifier::Threshold(_) => Err(DmsError::Config(
                "openness levels require hysteresis mode".into(),
            )),
        }
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn session(&self) -> &SubjectSession {
        &self.session
    }

    pub fn perclos(&self) -> f32 {
        self.perclos.perclos()
    }

    pub fn sleep_gate(&self) -> &SleepDurationGate {
        &self.sleep_gate
    }

    /// Reset subject state (on subject change)
    pub fn reset_state(&mut self) {
        self.session.reset();
        self.perclos.clear();
        self.sleep_gate.reset();
    }
}
