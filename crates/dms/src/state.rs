//! Subject state tracking

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Classification emitted for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrowsinessLabel {
    NoFaceDetected,
    Sleeping,
    Dizzy,
    Active,
    #[default]
    Unknown,
}

impl DrowsinessLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            DrowsinessLabel::NoFaceDetected => "NO_FACE_DETECTED",
            DrowsinessLabel::Sleeping => "SLEEPING",
            DrowsinessLabel::Dizzy => "DIZZY",
            DrowsinessLabel::Active => "ACTIVE",
            DrowsinessLabel::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable status line for overlays
    pub fn status_text(self) -> &'static str {
        match self {
            DrowsinessLabel::NoFaceDetected => "NO FACE DETECTED",
            DrowsinessLabel::Sleeping => "SLEEPING !!!",
            DrowsinessLabel::Dizzy => "DIZZY",
            DrowsinessLabel::Active => "ACTIVE",
            DrowsinessLabel::Unknown => "UNKNOWN",
        }
    }

    /// SLEEPING and DIZZY warrant an alert
    pub fn is_alert(self) -> bool {
        matches!(self, DrowsinessLabel::Sleeping | DrowsinessLabel::Dizzy)
    }
}

impl std::fmt::Display for DrowsinessLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Openness of one eye in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EyeOpenness {
    Open,
    Partial,
    Closed,
}

/// Mutable per-subject tracking state
///
/// Created empty when tracking begins and discarded when the subject's
/// stream ends. Never shared between subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSession {
    /// Consecutive frames with both eyes closed
    pub consecutive_closed_frames: u32,

    /// Consecutive frames with both eyes partially open
    pub consecutive_drowsy_frames: u32,

    /// Consecutive frames with both eyes open
    pub consecutive_active_frames: u32,

    /// Last label emitted by the hysteresis tracker
    pub label: DrowsinessLabel,
}

impl SubjectSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a closed frame, resetting the other runs
    pub fn record_closed(&mut self) -> u32 {
        self.consecutive_closed_frames = self.consecutive_closed_frames.saturating_add(1);
        self.consecutive_drowsy_frames = 0;
        self.consecutive_active_frames = 0;
        self.consecutive_closed_frames
    }

    /// Count a drowsy frame, resetting the other runs
    pub fn record_drowsy(&mut self) -> u32 {
        self.consecutive_drowsy_frames = self.consecutive_drowsy_frames.saturating_add(1);
        self.consecutive_closed_frames = 0;
        self.consecutive_active_frames = 0;
        self.consecutive_drowsy_frames
    }

    /// Count an active frame, resetting the other runs
    pub fn record_active(&mut self) -> u32 {
        self.consecutive_active_frames = self.consecutive_active_frames.saturating_add(1);
        self.consecutive_closed_frames = 0;
        self.consecutive_drowsy_frames = 0;
        self.consecutive_active_frames
    }

    /// Reset state (on subject change)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sliding window of averaged EAR samples for PERCLOS
#[derive(Debug, Clone)]
pub struct PerclosWindow {
    samples: VecDeque<f32>,
    capacity: usize,
    closed_below: f32,
}

impl PerclosWindow {
    pub fn new(capacity: usize, closed_below: f32) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            closed_below,
        }
    }

    /// Add an averaged EAR sample, evicting the oldest when full
    pub fn push(&mut self, ear: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ear);
    }

    /// Calculate PERCLOS (Percentage of Eye Closure)
    /// Higher PERCLOS indicates drowsiness
    pub fn perclos(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let closed_count = self
            .samples
            .iter()
            .filter(|&&v| v < self.closed_below)
            .count();

        closed_count as f32 / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
