//! Per-driver threshold calibration
//!
//! Collects resting EAR/MAR samples while the driver looks at the camera with
//! eyes open and mouth closed, then derives personal thresholds from the means.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::config::CalibrationConfig;
use crate::detector::DrowsinessDetector;
use crate::signal::FrameSignal;
use crate::DrowsinessError;

/// Thresholds derived from a calibration run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibratedThresholds {
    pub ear_threshold: f64,
    pub mar_threshold: f64,
}

impl CalibratedThresholds {
    /// Apply both thresholds to a detector through its setters
    pub fn apply(&self, detector: &mut DrowsinessDetector) -> Result<(), DrowsinessError> {
        detector.set_ear_threshold(self.ear_threshold)?;
        detector.set_mar_threshold(self.mar_threshold)
    }
}

/// Running EAR/MAR mean collector
#[derive(Debug, Clone)]
pub struct Calibrator {
    config: CalibrationConfig,
    active: bool,
    ear_sum: f64,
    mar_sum: f64,
    samples: usize,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            active: false,
            ear_sum: 0.0,
            mar_sum: 0.0,
            samples: 0,
        }
    }

    /// Start a new run, discarding any previous samples
    pub fn begin(&mut self) {
        self.clear();
        self.active = true;
        info!(min_samples = self.config.min_samples, "Calibration started");
    }

    /// Add one sample. Ignored when no run is active or the sample is not finite.
    ///
    /// Returns whether the sample was counted.
    pub fn feed(&mut self, signal: FrameSignal) -> bool {
        if !self.active {
            return false;
        }
        if !signal.is_finite() {
            warn!(ear = signal.ear, mar = signal.mar, "Skipping non-finite calibration sample");
            return false;
        }
        self.ear_sum += signal.ear;
        self.mar_sum += signal.mar;
        self.samples += 1;
        true
    }

    /// End the run and derive thresholds
    pub fn finish(&mut self) -> Result<CalibratedThresholds, DrowsinessError> {
        let collected = self.samples;
        let (ear_sum, mar_sum) = (self.ear_sum, self.mar_sum);
        self.clear();

        if collected < self.config.min_samples {
            warn!(collected, required = self.config.min_samples, "Calibration failed");
            return Err(DrowsinessError::InsufficientCalibrationData {
                collected,
                required: self.config.min_samples,
            });
        }

        let mean_ear = ear_sum / collected as f64;
        let mean_mar = mar_sum / collected as f64;
        let (ear_min, ear_max) = self.config.ear_bounds;
        let (mar_min, mar_max) = self.config.mar_bounds;

        let thresholds = CalibratedThresholds {
            ear_threshold: (mean_ear * self.config.ear_factor).clamp(ear_min, ear_max),
            mar_threshold: (mean_mar * self.config.mar_factor).clamp(mar_min, mar_max),
        };
        info!(
            collected,
            mean_ear,
            mean_mar,
            ear_threshold = thresholds.ear_threshold,
            mar_threshold = thresholds.mar_threshold,
            "Calibration finished"
        );
        Ok(thresholds)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn required_samples(&self) -> usize {
        self.config.min_samples
    }

    /// Drop collected samples but keep the run active
    ///
    /// Samples must come from one uninterrupted stretch of face frames.
    pub fn restart(&mut self) {
        if !self.active || self.samples == 0 {
            return;
        }
        info!(discarded = self.samples, "Calibration restarted after face loss");
        self.ear_sum = 0.0;
        self.mar_sum = 0.0;
        self.samples = 0;
    }

    /// Abandon the current run without deriving thresholds
    pub fn cancel(&mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        self.active = false;
        self.ear_sum = 0.0;
        self.mar_sum = 0.0;
        self.samples = 0;
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(samples: usize, ear: f64, mar: f64) -> Result<CalibratedThresholds, DrowsinessError> {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        for _ in 0..samples {
            calibrator.feed(FrameSignal::new(ear, mar));
        }
        calibrator.finish()
    }

    #[test]
    fn test_thresholds_from_means() {
        let thresholds = run(50, 0.30, 0.50).unwrap();
        assert!((thresholds.ear_threshold - 0.24).abs() < 1e-9);
        assert!((thresholds.mar_threshold - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds_are_clamped() {
        let high = run(60, 0.50, 0.90).unwrap();
        assert_eq!(high.ear_threshold, 0.30);
        assert_eq!(high.mar_threshold, 0.75);

        let low = run(60, 0.10, 0.20).unwrap();
        assert_eq!(low.ear_threshold, 0.15);
        assert_eq!(low.mar_threshold, 0.50);
    }

    #[test]
    fn test_insufficient_samples() {
        let err = run(49, 0.30, 0.40).unwrap_err();
        assert_eq!(
            err,
            DrowsinessError::InsufficientCalibrationData { collected: 49, required: 50 }
        );
    }

    #[test]
    fn test_samples_ignored_when_inactive() {
        let mut calibrator = Calibrator::default();
        assert!(!calibrator.feed(FrameSignal::new(0.3, 0.4)));
        assert_eq!(calibrator.sample_count(), 0);
    }

    #[test]
    fn test_non_finite_samples_not_counted() {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        for _ in 0..50 {
            calibrator.feed(FrameSignal::new(0.3, 0.4));
        }
        assert!(!calibrator.feed(FrameSignal::new(f64::NAN, 0.4)));
        assert_eq!(calibrator.sample_count(), 50);
        assert!(calibrator.finish().is_ok());
    }

    #[test]
    fn test_finish_ends_run() {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        calibrator.feed(FrameSignal::new(0.3, 0.4));
        assert!(calibrator.finish().is_err());
        assert!(!calibrator.is_active());
        assert_eq!(calibrator.sample_count(), 0);
    }

    #[test]
    fn test_begin_discards_previous_samples() {
        let mut calibrator = Calibrator::default();
        calibrator.begin();
        for _ in 0..40 {
            calibrator.feed(FrameSignal::new(0.3, 0.4));
        }
        calibrator.begin();
        assert_eq!(calibrator.sample_count(), 0);
    }

    #[test]
    fn test_restart_keeps_run_active() {
        let mut calibrator = Calibrator::default();
        calibrator.restart();
        assert!(!calibrator.is_active());

        calibrator.begin();
        for _ in 0..49 {
            calibrator.feed(FrameSignal::new(0.3, 0.4));
        }
        calibrator.restart();
        assert!(calibrator.is_active());
        assert_eq!(calibrator.sample_count(), 0);
    }

    #[test]
    fn test_apply_to_detector() {
        let mut detector = DrowsinessDetector::default();
        let thresholds = run(50, 0.30, 0.50).unwrap();
        thresholds.apply(&mut detector).unwrap();
        assert!((detector.ear_threshold() - 0.24).abs() < 1e-9);
        assert!((detector.mar_threshold() - 0.60).abs() < 1e-9);
    }
}
