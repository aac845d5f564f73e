//! Classifier and calibration configuration

use serde::{Deserialize, Serialize};
use crate::DrowsinessError;

/// Detector configuration
///
/// All durations are frame counts at the assumed `frame_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// EAR below this value counts as a closed-eye frame
    pub ear_threshold: f64,

    /// MAR above this value counts as a yawning frame
    pub mar_threshold: f64,

    /// Assumed camera cadence (frames per second)
    pub frame_rate: u32,

    /// Frames of suppressed scoring after a reset (~3s)
    pub grace_frames: u32,

    /// Consecutive closed-eye frames for a DANGER alert (~3s)
    pub eye_closed_frames_threshold: u32,

    /// Consecutive open-mouth frames that make one yawn (~2s)
    pub yawn_frames_threshold: u32,

    /// Remembered yawns for a DANGER alert
    pub yawn_count_threshold: u32,

    /// Frames without a new yawn before the yawn count is forgotten (~20s)
    pub yawn_memory_frames: u32,

    /// Score for a DANGER alert. WARNING fires at half of it.
    pub danger_score: f64,

    /// Score added per closed-eye frame
    pub eye_closed_increment: f64,

    /// Score removed per open-eye frame
    pub eye_open_decay: f64,

    /// Score added per counted yawn
    pub yawn_score_bonus: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            mar_threshold: 0.60,
            frame_rate: 30,
            grace_frames: 90,
            eye_closed_frames_threshold: 90,
            yawn_frames_threshold: 60,
            yawn_count_threshold: 4,
            yawn_memory_frames: 600,
            danger_score: 200.0,
            eye_closed_increment: 0.5,
            eye_open_decay: 0.3,
            yawn_score_bonus: 50.0,
        }
    }
}

impl DetectorConfig {
    /// Create strict config (alerts fire sooner)
    pub fn strict() -> Self {
        Self {
            eye_closed_frames_threshold: 60,
            yawn_count_threshold: 3,
            danger_score: 150.0,
            ..Default::default()
        }
    }

    /// Create lenient config (alerts fire later)
    pub fn lenient() -> Self {
        Self {
            eye_closed_frames_threshold: 120,
            yawn_count_threshold: 5,
            danger_score: 250.0,
            ..Default::default()
        }
    }

    /// Score at which a WARNING is raised
    pub fn warning_score(&self) -> f64 {
        self.danger_score * 0.5
    }

    /// Check that thresholds and cadence are usable
    pub fn validate(&self) -> Result<(), DrowsinessError> {
        check_ratio("ear", self.ear_threshold)?;
        check_ratio("mar", self.mar_threshold)?;
        if self.frame_rate == 0 {
            return Err(DrowsinessError::Config("frame_rate must be positive".into()));
        }
        for (name, frames) in [
            ("yawn_frames_threshold", self.yawn_frames_threshold),
            ("eye_closed_frames_threshold", self.eye_closed_frames_threshold),
            ("yawn_count_threshold", self.yawn_count_threshold),
        ] {
            if frames == 0 {
                return Err(DrowsinessError::Config(format!("{} must be positive", name)));
            }
        }
        for (name, step) in [
            ("eye_closed_increment", self.eye_closed_increment),
            ("eye_open_decay", self.eye_open_decay),
            ("yawn_score_bonus", self.yawn_score_bonus),
        ] {
            if !(step.is_finite() && step >= 0.0) {
                return Err(DrowsinessError::Config(format!(
                    "{} must not be negative, got {}",
                    name, step
                )));
            }
        }
        if !(self.danger_score.is_finite() && self.danger_score > 0.0) {
            return Err(DrowsinessError::Config(format!(
                "danger_score must be positive, got {}",
                self.danger_score
            )));
        }
        Ok(())
    }
}

/// Reject non-finite and non-positive ratio thresholds
pub(crate) fn check_ratio(name: &'static str, value: f64) -> Result<(), DrowsinessError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DrowsinessError::InvalidThreshold { name, value })
    }
}

/// Calibration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Minimum valid samples before thresholds can be derived
    pub min_samples: usize,

    /// EAR threshold as a fraction of the driver's resting EAR
    pub ear_factor: f64,

    /// Allowed EAR threshold range
    pub ear_bounds: (f64, f64),

    /// MAR threshold as a multiple of the driver's resting MAR
    pub mar_factor: f64,

    /// Allowed MAR threshold range
    pub mar_bounds: (f64, f64),
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_samples: 50,
            ear_factor: 0.80,
            ear_bounds: (0.15, 0.30),
            mar_factor: 1.20,
            mar_bounds: (0.50, 0.75),
        }
    }
}
