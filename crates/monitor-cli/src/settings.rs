//! Layered monitor settings
//!
//! Sources, lowest priority first:
//! - built-in defaults
//! - optional TOML/JSON/YAML file
//! - `DROWSY_` environment variables (`__` separates nested keys,
//!   e.g. `DROWSY_DMS__MODE=hysteresis`)

use std::path::Path;

use alerting::AlertConfig;
use config::{Config, Environment, File};
use dms::DmsConfig;
use landmarks::LandmarkScheme;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::MonitorError;

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            json: false,
        }
    }
}

/// Top-level settings for the replay monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Landmark scheme of the recorded frames
    pub scheme: LandmarkScheme,
    /// Frames buffered per subject before the reader waits
    pub channel_capacity: usize,
    pub dms: DmsConfig,
    pub alerts: AlertConfig,
    pub log: LogSettings,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            scheme: LandmarkScheme::default(),
            channel_capacity: 64,
            dms: DmsConfig::default(),
            alerts: AlertConfig::default(),
            log: LogSettings::default(),
        }
    }
}

impl MonitorSettings {
    /// Load settings from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("DROWSY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: MonitorSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.channel_capacity == 0 {
            return Err(MonitorError::Settings("channel_capacity must be positive".into()));
        }
        self.dms.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::ClassificationMode;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let settings = MonitorSettings::load(None).unwrap();
        assert_eq!(settings.scheme, LandmarkScheme::MediaPipe468);
        assert_eq!(settings.dms.mode, ClassificationMode::Threshold);
        assert_eq!(settings.alerts.history_capacity, 10);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
scheme = "dlib68"

[dms]
mode = "hysteresis"
min_drowsy_frames = 3

[dms.ear_thresholds]
low = 0.18
mid = 0.24
"#
        )
        .unwrap();

        let settings = MonitorSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.scheme, LandmarkScheme::Dlib68);
        assert_eq!(settings.dms.mode, ClassificationMode::Hysteresis);
        assert_eq!(settings.dms.min_drowsy_frames, 3);
        assert!((settings.dms.ear_thresholds.low - 0.18).abs() < 1e-6);
        assert_eq!(settings.dms.frame_interval_ms, 33);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "channel_capacity = 0").unwrap();
        assert!(matches!(
            MonitorSettings::load(Some(file.path())),
            Err(MonitorError::Settings(_))
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            MonitorSettings::load(Some(&missing)),
            Err(MonitorError::Config(_))
        ));
    }
}
