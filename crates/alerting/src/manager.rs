//! Alert Manager Implementation

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dms::DrowsinessLabel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Number of alerts kept in history (default: 10)
    pub history_capacity: usize,
    /// How long a sounded alarm stays latched before it may sound again (ms)
    pub alarm_hold_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            alarm_hold_ms: 2500,
        }
    }
}

/// Kind of drowsiness alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Sleeping,
    Drowsy,
}

impl AlertKind {
    /// Alert kind for a label, if the label warrants one
    pub fn from_label(label: DrowsinessLabel) -> Option<Self> {
        match label {
            DrowsinessLabel::Sleeping => Some(AlertKind::Sleeping),
            DrowsinessLabel::Dizzy => Some(AlertKind::Drowsy),
            _ => None,
        }
    }
}

/// Recorded alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessAlert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub raised_at: DateTime<Utc>,
}

/// What observing one label did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertOutcome {
    /// Alert added to history by this label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded: Option<DrowsinessAlert>,
    /// The alarm should start sounding
    pub sound_alarm: bool,
    /// A latched alarm was silenced by an ACTIVE label
    pub alarm_cleared: bool,
}

/// Alert manager for one subject
pub struct AlertManager {
    /// Configuration
    config: AlertConfig,
    /// Most recent alerts, newest first
    history: VecDeque<DrowsinessAlert>,
    /// When the latched alarm started sounding
    alarm_started: Option<DateTime<Utc>>,
    /// Previously observed label
    last_label: Option<DrowsinessLabel>,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        debug!("Creating alert manager with config: {:?}", config);
        Self {
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            alarm_started: None,
            last_label: None,
        }
    }

    /// Feed the label of the next frame
    ///
    /// A SLEEPING or DIZZY label records an alert when it differs from the
    /// previous label or when the latched alarm has expired. ACTIVE silences
    /// the alarm. A label stamped earlier than the latched alarm releases it.
    pub fn observe(&mut self, label: DrowsinessLabel, at: DateTime<Utc>) -> AlertOutcome {
        let mut outcome = AlertOutcome::default();
        let hold = self.alarm_hold();

        let expired = self.alarm_started.map_or(true, |started| {
            let elapsed = at.signed_duration_since(started);
            elapsed >= hold || elapsed < Duration::zero()
        });
        if expired {
            self.alarm_started = None;
        }

        if let Some(kind) = AlertKind::from_label(label) {
            let changed = self.last_label != Some(label);
            if changed || expired {
                outcome.recorded = Some(self.record(kind, at));
            }
            if self.alarm_started.is_none() {
                self.alarm_started = Some(at);
                outcome.sound_alarm = true;
            }
        } else if label == DrowsinessLabel::Active && self.alarm_started.take().is_some() {
            info!("Alarm cleared: subject active");
            outcome.alarm_cleared = true;
        }

        self.last_label = Some(label);
        outcome
    }

    /// Configured hold, saturating at the largest representable span
    fn alarm_hold(&self) -> Duration {
        i64::try_from(self.config.alarm_hold_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX)
    }

    fn record(&mut self, kind: AlertKind, at: DateTime<Utc>) -> DrowsinessAlert {
        let alert = DrowsinessAlert {
            id: Uuid::new_v4(),
            kind,
            raised_at: at,
        };

        self.history.push_front(alert.clone());
        self.history.truncate(self.config.history_capacity);

        info!("Alert recorded: {:?} at {}", kind, at.format("%H:%M:%S"));
        alert
    }

    /// Alerts newest first
    pub fn history(&self) -> impl Iterator<Item = &DrowsinessAlert> {
        self.history.iter()
    }

    /// Whether an alarm is currently latched
    pub fn alarm_active(&self) -> bool {
        self.alarm_started.is_some()
    }

    /// Clear all alert states
    pub fn clear(&mut self) {
        self.history.clear();
        self.alarm_started = None;
        self.last_label = None;
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    #[test]
    fn test_alert_on_transition() {
        let mut manager = AlertManager::default();

        assert_eq!(manager.observe(DrowsinessLabel::Active, t(0)), AlertOutcome::default());

        let outcome = manager.observe(DrowsinessLabel::Dizzy, t(100));
        assert_eq!(outcome.recorded.as_ref().map(|a| a.kind), Some(AlertKind::Drowsy));
        assert!(outcome.sound_alarm);
        assert!(manager.alarm_active());

        // Same label within the hold period is not repeated
        let outcome = manager.observe(DrowsinessLabel::Dizzy, t(200));
        assert!(outcome.recorded.is_none());
        assert!(!outcome.sound_alarm);
    }

    #[test]
    fn test_escalation_records_without_resounding() {
        let mut manager = AlertManager::default();
        manager.observe(DrowsinessLabel::Dizzy, t(0));

        let outcome = manager.observe(DrowsinessLabel::Sleeping, t(500));
        assert_eq!(outcome.recorded.map(|a| a.kind), Some(AlertKind::Sleeping));
        assert!(!outcome.sound_alarm);
        assert_eq!(manager.history().count(), 2);
        assert_eq!(manager.history().next().map(|a| a.kind), Some(AlertKind::Sleeping));
    }

    #[test]
    fn test_alarm_resounds_after_hold() {
        let mut manager = AlertManager::default();
        manager.observe(DrowsinessLabel::Sleeping, t(0));

        let outcome = manager.observe(DrowsinessLabel::Sleeping, t(2500));
        assert!(outcome.sound_alarm);
        assert!(outcome.recorded.is_some());
        assert_eq!(manager.history().count(), 2);
    }

    #[test]
    fn test_active_clears_alarm() {
        let mut manager = AlertManager::default();
        manager.observe(DrowsinessLabel::Sleeping, t(0));

        let outcome = manager.observe(DrowsinessLabel::Active, t(100));
        assert!(outcome.alarm_cleared);
        assert!(!manager.alarm_active());

        let outcome = manager.observe(DrowsinessLabel::Sleeping, t(200));
        assert!(outcome.sound_alarm);
    }

    #[test]
    fn test_unknown_keeps_alarm_latched() {
        let mut manager = AlertManager::default();
        manager.observe(DrowsinessLabel::Sleeping, t(0));
        let outcome = manager.observe(DrowsinessLabel::NoFaceDetected, t(100));
        assert!(!outcome.alarm_cleared);
        assert!(manager.alarm_active());
    }

    #[test]
    fn test_history_capacity() {
        let config = AlertConfig {
            history_capacity: 3,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config);
        for i in 0..5 {
            manager.observe(DrowsinessLabel::Sleeping, t(i * 10));
            manager.observe(DrowsinessLabel::Active, t(i * 10 + 5));
        }
        assert_eq!(manager.history().count(), 3);
        assert_eq!(manager.history().next().unwrap().raised_at, t(40));
    }

    #[test]
    fn test_huge_hold_keeps_alarm_latched() {
        let config = AlertConfig {
            alarm_hold_ms: u64::MAX,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config);
        assert!(manager.observe(DrowsinessLabel::Sleeping, t(0)).sound_alarm);

        let outcome = manager.observe(DrowsinessLabel::Sleeping, t(86_400_000));
        assert!(!outcome.sound_alarm);
        assert!(outcome.recorded.is_none());
        assert!(manager.alarm_active());
    }

    #[test]
    fn test_clock_going_backwards_releases_alarm() {
        let mut manager = AlertManager::default();
        manager.observe(DrowsinessLabel::Sleeping, t(10_000));

        let outcome = manager.observe(DrowsinessLabel::Sleeping, t(0));
        assert!(outcome.sound_alarm);
        assert_eq!(manager.history().count(), 2);
    }

    #[test]
    fn test_alert_serializes() {
        let mut manager = AlertManager::default();
        let alert = manager
            .observe(DrowsinessLabel::Dizzy, t(0))
            .recorded
            .unwrap();
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["kind"], "drowsy");
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["id", "kind", "raised_at"]);
    }
}
