//! Alerting System
//!
//! Records drowsiness alerts raised by the per-frame label stream and
//! latches an alarm until the subject is active again.

mod manager;

pub use manager::{AlertConfig, AlertKind, AlertManager, AlertOutcome, DrowsinessAlert};
