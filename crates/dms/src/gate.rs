//! Sustained-sleep duration gate
//!
//! The classifiers emit SLEEPING on the first closed frame. Callers that
//! only want to alarm after a minimum duration layer this gate on top of
//! the per-frame labels.

use std::time::Duration;

use crate::config::DmsConfig;
use crate::state::DrowsinessLabel;

/// Counts a SLEEPING run and converts it to elapsed time
#[derive(Debug, Clone)]
pub struct SleepDurationGate {
    frame_interval: Duration,
    required: Duration,
    run_frames: u32,
}

impl SleepDurationGate {
    pub fn new(frame_interval: Duration, required: Duration) -> Self {
        Self {
            frame_interval,
            required,
            run_frames: 0,
        }
    }

    pub fn from_config(config: &DmsConfig) -> Self {
        Self::new(
            Duration::from_millis(config.frame_interval_ms),
            Duration::from_millis(config.sustained_sleep_ms),
        )
    }

    /// Feed the label of the next frame; returns whether sleep is sustained
    ///
    /// NO_FACE_DETECTED holds the run, every other non-sleeping label ends it.
    pub fn observe(&mut self, label: DrowsinessLabel) -> bool {
        match label {
            DrowsinessLabel::Sleeping => self.run_frames = self.run_frames.saturating_add(1),
            DrowsinessLabel::NoFaceDetected => {}
            _ => self.run_frames = 0,
        }
        self.is_sustained()
    }

    /// Length of the current SLEEPING run, saturating at `Duration::MAX`
    pub fn sleeping_for(&self) -> Duration {
        self.frame_interval
            .checked_mul(self.run_frames)
            .unwrap_or(Duration::MAX)
    }

    pub fn run_frames(&self) -> u32 {
        self.run_frames
    }

    pub fn is_sustained(&self) -> bool {
        self.run_frames > 0 && self.sleeping_for() >= self.required
    }

    pub fn reset(&mut self) {
        self.run_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SleepDurationGate {
        SleepDurationGate::new(Duration::from_millis(100), Duration::from_millis(500))
    }

    #[test]
    fn test_fires_after_required_duration() {
        let mut gate = gate();
        for _ in 0..4 {
            assert!(!gate.observe(DrowsinessLabel::Sleeping));
        }
        assert!(gate.observe(DrowsinessLabel::Sleeping));
        assert_eq!(gate.sleeping_for(), Duration::from_millis(500));
    }

    #[test]
    fn test_wake_resets_run() {
        let mut gate = gate();
        for _ in 0..4 {
            gate.observe(DrowsinessLabel::Sleeping);
        }
        assert!(!gate.observe(DrowsinessLabel::Active));
        assert_eq!(gate.run_frames(), 0);
        assert!(!gate.observe(DrowsinessLabel::Sleeping));
    }

    #[test]
    fn test_detection_miss_holds_run() {
        let mut gate = gate();
        for _ in 0..4 {
            gate.observe(DrowsinessLabel::Sleeping);
        }
        assert!(!gate.observe(DrowsinessLabel::NoFaceDetected));
        assert_eq!(gate.run_frames(), 4);
        assert!(gate.observe(DrowsinessLabel::Sleeping));
    }

    #[test]
    fn test_default_config_needs_five_seconds() {
        let mut gate = SleepDurationGate::from_config(&DmsConfig::default());
        // 151 frames * 33ms = 4983ms
        for _ in 0..151 {
            assert!(!gate.observe(DrowsinessLabel::Sleeping));
        }
        assert!(gate.observe(DrowsinessLabel::Sleeping));
    }

    #[test]
    fn test_huge_frame_interval_saturates() {
        let longest = Duration::from_secs(u64::MAX);
        let mut gate = SleepDurationGate::new(longest, longest);
        assert!(gate.observe(DrowsinessLabel::Sleeping));
        assert!(gate.observe(DrowsinessLabel::Sleeping));
        assert_eq!(gate.sleeping_for(), Duration::MAX);

        let mut gate = SleepDurationGate::from_config(&DmsConfig {
            frame_interval_ms: u64::MAX,
            ..Default::default()
        });
        for _ in 0..3 {
            assert!(gate.observe(DrowsinessLabel::Sleeping));
        }
    }
}
