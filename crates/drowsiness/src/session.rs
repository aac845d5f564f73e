//! Monitoring session
//!
//! Owns one detector for the lifetime of a driving session and handles the
//! frame-level glue around it: start/stop, frames without a face, alert
//! acknowledgment and calibration.

use tracing::info;
use crate::calibration::Calibrator;
use crate::config::{CalibrationConfig, DetectorConfig};
use crate::detector::DrowsinessDetector;
use crate::report::StatusReport;
use crate::signal::FrameSignal;
use crate::DrowsinessError;

/// Driver monitoring session
pub struct MonitorSession {
    detector: DrowsinessDetector,
    calibrator: Calibrator,
    running: bool,
    latest: Option<StatusReport>,
}

impl MonitorSession {
    /// Create a stopped session
    pub fn new(config: DetectorConfig, calibration: CalibrationConfig) -> Result<Self, DrowsinessError> {
        Ok(Self {
            detector: DrowsinessDetector::new(config)?,
            calibrator: Calibrator::new(calibration),
            running: false,
            latest: None,
        })
    }

    /// Start monitoring. Arms the grace period.
    pub fn start(&mut self) {
        self.detector.reset();
        self.running = true;
        info!("Monitoring started");
    }

    /// Stop monitoring and drop any calibration in progress
    pub fn stop(&mut self) {
        self.running = false;
        self.detector.reset();
        self.calibrator.cancel();
        self.latest = None;
        info!("Monitoring stopped");
    }

    /// Process one frame. `None` means no face was detected.
    ///
    /// Returns `None` while the session is stopped. Frames without a face
    /// leave the detector state untouched and restart a calibration run, so
    /// calibration samples are always consecutive face frames.
    pub fn process(&mut self, signal: Option<FrameSignal>) -> Option<StatusReport> {
        if !self.running {
            return None;
        }

        let report = match signal {
            Some(signal) => {
                self.calibrator.feed(signal);
                self.detector.update_signal(signal)
            }
            None => {
                self.calibrator.restart();
                StatusReport::no_face()
            }
        };

        self.latest = Some(report.clone());
        Some(report)
    }

    /// Driver dismissed the alert: start over with a fresh grace period
    pub fn acknowledge_alert(&mut self) {
        info!(
            total_yawns = self.detector.state().total_yawns,
            drowsiness_score = self.detector.state().drowsiness_score,
            "Alert acknowledged"
        );
        self.detector.reset();
    }

    pub fn begin_calibration(&mut self) {
        self.calibrator.begin();
    }

    /// Add a calibration sample outside of [`process`](Self::process)
    pub fn feed_calibration_sample(&mut self, ear: f64, mar: f64) -> bool {
        self.calibrator.feed(FrameSignal::new(ear, mar))
    }

    /// Derive thresholds from the collected samples and apply them
    ///
    /// Returns the new `(ear_threshold, mar_threshold)`.
    pub fn finish_calibration(&mut self) -> Result<(f64, f64), DrowsinessError> {
        let thresholds = self.calibrator.finish()?;
        thresholds.apply(&mut self.detector)?;
        Ok((thresholds.ear_threshold, thresholds.mar_threshold))
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_active()
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Most recent report
    pub fn latest(&self) -> Option<&StatusReport> {
        self.latest.as_ref()
    }

    pub fn detector(&self) -> &DrowsinessDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut DrowsinessDetector {
        &mut self.detector
    }
}

impl Default for MonitorSession {
    fn default() -> Self {
        Self {
            detector: DrowsinessDetector::default(),
            calibrator: Calibrator::default(),
            running: false,
            latest: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::AlertLevel;

    fn face(ear: f64, mar: f64) -> Option<FrameSignal> {
        Some(FrameSignal::new(ear, mar))
    }

    fn running_past_grace() -> MonitorSession {
        let mut session = MonitorSession::default();
        session.start();
        for _ in 0..90 {
            session.process(face(0.30, 0.40));
        }
        session
    }

    #[test]
    fn test_stopped_session_ignores_frames() {
        let mut session = MonitorSession::default();
        assert!(session.process(face(0.3, 0.4)).is_none());
        assert!(session.latest().is_none());
    }

    #[test]
    fn test_start_arms_grace_period() {
        let mut session = MonitorSession::default();
        session.start();
        assert!(session.detector().in_grace_period());
        let report = session.process(face(0.1, 0.9)).unwrap();
        assert_eq!(report.alert_level, AlertLevel::Safe);
    }

    #[test]
    fn test_no_face_freezes_detector() {
        let mut session = running_past_grace();
        for _ in 0..30 {
            session.process(face(0.20, 0.40));
        }
        let before = session.detector().state().clone();

        for _ in 0..200 {
            let report = session.process(None).unwrap();
            assert_eq!(report.alert_level, AlertLevel::NoFace);
            assert_eq!(report.eye_closed_frames, 0);
        }
        assert_eq!(session.detector().state(), &before);

        let report = session.process(face(0.20, 0.40)).unwrap();
        assert_eq!(report.eye_closed_frames, 31);
    }

    #[test]
    fn test_acknowledge_clears_alert() {
        let mut session = running_past_grace();
        let mut report = None;
        for _ in 0..90 {
            report = session.process(face(0.20, 0.40));
        }
        assert_eq!(report.unwrap().alert_level, AlertLevel::Danger);

        session.acknowledge_alert();
        assert!(!session.detector().state().alert_active);
        assert!(session.detector().in_grace_period());
        let report = session.process(face(0.20, 0.40)).unwrap();
        assert_eq!(report.alert_level, AlertLevel::Safe);
    }

    #[test]
    fn test_calibration_through_frames() {
        let mut session = running_past_grace();
        session.begin_calibration();
        for _ in 0..50 {
            session.process(face(0.30, 0.50));
        }
        assert_eq!(session.calibrator().sample_count(), 50);

        let (ear, mar) = session.finish_calibration().unwrap();
        assert!((ear - 0.24).abs() < 1e-9);
        assert!((mar - 0.60).abs() < 1e-9);
        assert!((session.detector().ear_threshold() - 0.24).abs() < 1e-9);
        assert!(!session.is_calibrating());
    }

    #[test]
    fn test_face_loss_restarts_calibration() {
        let mut session = running_past_grace();
        session.begin_calibration();
        for _ in 0..49 {
            session.process(face(0.30, 0.50));
        }
        session.process(None);
        assert!(session.is_calibrating());
        assert_eq!(session.calibrator().sample_count(), 0);

        for _ in 0..49 {
            session.process(face(0.30, 0.50));
        }
        assert!(matches!(
            session.finish_calibration(),
            Err(DrowsinessError::InsufficientCalibrationData { collected: 49, required: 50 })
        ));

        session.begin_calibration();
        for _ in 0..50 {
            session.process(face(0.30, 0.50));
        }
        assert!(session.finish_calibration().is_ok());
    }

    #[test]
    fn test_calibration_insufficient_keeps_thresholds() {
        let mut session = running_past_grace();
        session.begin_calibration();
        for _ in 0..10 {
            session.feed_calibration_sample(0.35, 0.30);
        }
        assert!(matches!(
            session.finish_calibration(),
            Err(DrowsinessError::InsufficientCalibrationData { collected: 10, required: 50 })
        ));
        assert_eq!(session.detector().ear_threshold(), 0.25);
        assert_eq!(session.detector().mar_threshold(), 0.60);
    }

    #[test]
    fn test_stop_cancels_calibration() {
        let mut session = running_past_grace();
        session.begin_calibration();
        session.process(face(0.3, 0.4));
        session.stop();
        assert!(!session.is_running());
        assert!(!session.is_calibrating());
        assert!(session.latest().is_none());
    }
}
