//! Drowsiness state machine

use tracing::{debug, info, warn};
use crate::config::{check_ratio, DetectorConfig};
use crate::report::{AlertLevel, StatusReport};
use crate::signal::FrameSignal;
use crate::state::DetectorState;
use crate::DrowsinessError;

/// Debounced EAR/MAR drowsiness classifier
///
/// Expects exactly one [`update`](Self::update) call per video frame at the
/// configured `frame_rate`. Call [`reset`](Self::reset) when a monitoring
/// session starts so the grace period is armed.
#[derive(Debug, Clone)]
pub struct DrowsinessDetector {
    config: DetectorConfig,
    state: DetectorState,
}

impl DrowsinessDetector {
    /// Create a new detector with configuration
    ///
    /// The grace period is not armed until the first [`reset`](Self::reset).
    pub fn new(config: DetectorConfig) -> Result<Self, DrowsinessError> {
        config.validate()?;
        info!(
            ear_threshold = config.ear_threshold,
            mar_threshold = config.mar_threshold,
            frame_rate = config.frame_rate,
            "Creating drowsiness detector"
        );
        Ok(Self {
            config,
            state: DetectorState::default(),
        })
    }

    /// Zero all counters and the score, clear the alert and arm the grace period
    pub fn reset(&mut self) {
        self.state.reset(self.config.grace_frames);
        info!(grace_frames = self.config.grace_frames, "Detector reset");
    }

    /// Classify one frame
    pub fn update(&mut self, ear: f64, mar: f64) -> StatusReport {
        if self.state.pause_scoring_frames > 0 {
            self.state.pause_scoring_frames -= 1;
            let seconds = self.state.pause_scoring_frames / self.config.frame_rate + 1;
            return StatusReport::safe(ear, mar, format!("alert ({}s)", seconds));
        }

        self.track_eyes(ear);
        self.track_yawn(mar);
        self.age_yawns();
        self.classify(ear, mar)
    }

    /// Classify one frame from a [`FrameSignal`]
    pub fn update_signal(&mut self, signal: FrameSignal) -> StatusReport {
        self.update(signal.ear, signal.mar)
    }

    fn track_eyes(&mut self, ear: f64) {
        if ear < self.config.ear_threshold {
            self.state.eye_closed_frames = self.state.eye_closed_frames.saturating_add(1);
            self.state.drowsiness_score += self.config.eye_closed_increment;
        } else {
            self.state.eye_closed_frames = 0;
            self.state.drowsiness_score =
                (self.state.drowsiness_score - self.config.eye_open_decay).max(0.0);
        }
    }

    fn track_yawn(&mut self, mar: f64) {
        if mar > self.config.mar_threshold {
            self.state.yawn_frames = self.state.yawn_frames.saturating_add(1);
            // Count once, on the frame the run becomes long enough
            if self.state.yawn_frames == self.config.yawn_frames_threshold {
                self.state.total_yawns += 1;
                self.state.drowsiness_score += self.config.yawn_score_bonus;
                self.state.frames_since_last_yawn = 0;
                debug!(total_yawns = self.state.total_yawns, "Yawn counted");
            }
        } else {
            self.state.yawn_frames = 0;
        }
    }

    fn age_yawns(&mut self) {
        if self.state.total_yawns == 0 {
            return;
        }
        self.state.frames_since_last_yawn += 1;
        if self.state.frames_since_last_yawn >= self.config.yawn_memory_frames {
            debug!(forgotten = self.state.total_yawns, "Yawn memory expired");
            self.state.total_yawns = 0;
            self.state.frames_since_last_yawn = 0;
        }
    }

    fn classify(&mut self, ear: f64, mar: f64) -> StatusReport {
        let state = &self.state;
        let config = &self.config;

        // Ordered rules: the first match wins
        let (alert_level, reason) = if state.eye_closed_frames >= config.eye_closed_frames_threshold {
            (AlertLevel::Danger, "eyes closed too long".to_string())
        } else if state.total_yawns >= config.yawn_count_threshold {
            (AlertLevel::Danger, format!("yawned {} times", state.total_yawns))
        } else if state.drowsiness_score >= config.danger_score {
            (AlertLevel::Danger, "strong drowsiness signal".to_string())
        } else if state.drowsiness_score >= config.warning_score() {
            (AlertLevel::Warning, "signs of fatigue".to_string())
        } else {
            (AlertLevel::Safe, "alert".to_string())
        };

        match alert_level {
            AlertLevel::Danger => {
                if !self.state.alert_active {
                    warn!(
                        reason = %reason,
                        eye_closed_frames = self.state.eye_closed_frames,
                        total_yawns = self.state.total_yawns,
                        drowsiness_score = self.state.drowsiness_score,
                        "Drowsiness alert raised"
                    );
                }
                self.state.alert_active = true;
            }
            AlertLevel::Safe => self.state.alert_active = false,
            AlertLevel::Warning | AlertLevel::NoFace => {}
        }

        StatusReport {
            drowsy: alert_level == AlertLevel::Danger,
            alert_level,
            reason,
            ear,
            mar,
            eye_closed_frames: self.state.eye_closed_frames,
            yawn_frames: self.state.yawn_frames,
            total_yawns: self.state.total_yawns,
            drowsiness_score: self.state.drowsiness_score,
            alert_active: self.state.alert_active,
        }
    }

    /// Current EAR threshold
    pub fn ear_threshold(&self) -> f64 {
        self.config.ear_threshold
    }

    /// Current MAR threshold
    pub fn mar_threshold(&self) -> f64 {
        self.config.mar_threshold
    }

    /// Change the EAR threshold. Counters are left as they are.
    pub fn set_ear_threshold(&mut self, value: f64) -> Result<(), DrowsinessError> {
        check_ratio("ear", value)?;
        info!(old = self.config.ear_threshold, new = value, "EAR threshold updated");
        self.config.ear_threshold = value;
        Ok(())
    }

    /// Change the MAR threshold. Counters are left as they are.
    pub fn set_mar_threshold(&mut self, value: f64) -> Result<(), DrowsinessError> {
        check_ratio("mar", value)?;
        info!(old = self.config.mar_threshold, new = value, "MAR threshold updated");
        self.config.mar_threshold = value;
        Ok(())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    pub fn in_grace_period(&self) -> bool {
        self.state.in_grace_period()
    }
}

impl Default for DrowsinessDetector {
    fn default() -> Self {
        Self {
            config: DetectorConfig::default(),
            state: DetectorState::default(),
        }
    }
}
