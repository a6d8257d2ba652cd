//! Drowsiness Monitor Replay
//!
//! Reads pre-computed facial landmark frames (one JSON object per line),
//! routes each subject's frames to its own monitor task and writes one
//! JSON report per frame.

pub mod runner;
pub mod settings;

pub use runner::{run, FrameReport, RunSummary, SubjectSummary};
pub use settings::{LogSettings, MonitorSettings};

use thiserror::Error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Dms(#[from] dms::DmsError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Subject task failed: {0}")]
    Task(String),
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured filter. Logs go to
/// stderr so stdout carries only frame reports.
pub fn init_logging(log: &LogSettings) -> Result<(), MonitorError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if log.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| MonitorError::Logging(e.to_string()))
}
