//! Driver Drowsiness Classifier
//!
//! Turns a per-frame stream of eye-openness (EAR) and mouth-openness (MAR)
//! ratios into a debounced alert level:
//! - Sustained eye closure
//! - Yawn counting with a forgetting window
//! - Accumulated drowsiness score
//! - Startup grace period after every reset
//!
//! Landmark extraction, rendering and audio live outside this crate. Callers
//! feed one [`FrameSignal`] per frame at roughly 30 Hz and render the returned
//! [`StatusReport`].

pub mod calibration;
pub mod config;
pub mod detector;
pub mod report;
pub mod session;
pub mod signal;
pub mod state;

pub use calibration::{CalibratedThresholds, Calibrator};
pub use config::{CalibrationConfig, DetectorConfig};
pub use detector::DrowsinessDetector;
pub use report::{AlertLevel, StatusReport};
pub use session::MonitorSession;
pub use signal::{FrameSignal, Point};
pub use state::DetectorState;

use thiserror::Error;

/// Drowsiness classifier error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrowsinessError {
    #[error("Insufficient calibration data: {collected} samples collected, {required} required")]
    InsufficientCalibrationData { collected: usize, required: usize },

    #[error("Invalid {name} threshold: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Configuration error: {0}")]
    Config(String),
}
