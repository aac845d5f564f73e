//! Per-frame status report

use serde::{Deserialize, Serialize};

/// Alert level of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    #[default]
    Safe,
    Warning,
    Danger,
    /// No face in front of the camera. Produced by the caller, never by the detector.
    NoFace,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Safe => "SAFE",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Danger => "DANGER",
            AlertLevel::NoFace => "NO_FACE",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Classifier output for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Driver considered drowsy (DANGER only)
    pub drowsy: bool,

    pub alert_level: AlertLevel,

    /// Human-readable cause of the alert level
    pub reason: String,

    pub ear: f64,
    pub mar: f64,
    pub eye_closed_frames: u32,
    pub yawn_frames: u32,
    pub total_yawns: u32,
    pub drowsiness_score: f64,

    /// Sticky alert flag, cleared by a SAFE frame or a reset
    pub alert_active: bool,
}

impl StatusReport {
    /// Report for a frame without a detected face
    pub fn no_face() -> Self {
        Self {
            alert_level: AlertLevel::NoFace,
            reason: "no face detected".to_string(),
            ..Self::safe(0.0, 0.0, String::new())
        }
    }

    /// SAFE report with every counter at zero
    pub(crate) fn safe(ear: f64, mar: f64, reason: String) -> Self {
        Self {
            drowsy: false,
            alert_level: AlertLevel::Safe,
            reason,
            ear,
            mar,
            eye_closed_frames: 0,
            yawn_frames: 0,
            total_yawns: 0,
            drowsiness_score: 0.0,
            alert_active: false,
        }
    }

    /// Status line for display
    pub fn status_text(&self) -> String {
        match self.alert_level {
            AlertLevel::Danger => format!("ALERT: {}", self.reason),
            AlertLevel::Warning => format!("CAUTION: {}", self.reason),
            AlertLevel::Safe | AlertLevel::NoFace => self.reason.clone(),
        }
    }

    /// Score as a percentage of `danger_score`, clamped to 0..=100 for display
    pub fn score_percentage(&self, danger_score: f64) -> f64 {
        if danger_score <= 0.0 {
            return 0.0;
        }
        (self.drowsiness_score / danger_score * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_report() {
        let report = StatusReport::no_face();
        assert_eq!(report.alert_level, AlertLevel::NoFace);
        assert!(!report.drowsy);
        assert_eq!(report.eye_closed_frames, 0);
        assert_eq!(report.total_yawns, 0);
        assert_eq!(report.drowsiness_score, 0.0);
        assert!(!report.alert_active);
    }

    #[test]
    fn test_status_text_prefix() {
        let mut report = StatusReport::safe(0.3, 0.4, "alert".into());
        assert_eq!(report.status_text(), "alert");

        report.alert_level = AlertLevel::Warning;
        report.reason = "signs of fatigue".into();
        assert_eq!(report.status_text(), "CAUTION: signs of fatigue");

        report.alert_level = AlertLevel::Danger;
        report.reason = "eyes closed too long".into();
        assert_eq!(report.status_text(), "ALERT: eyes closed too long");
    }

    #[test]
    fn test_score_percentage_clamped() {
        let mut report = StatusReport::safe(0.3, 0.4, String::new());
        report.drowsiness_score = 50.0;
        assert!((report.score_percentage(200.0) - 25.0).abs() < 1e-9);

        report.drowsiness_score = 450.0;
        assert_eq!(report.score_percentage(200.0), 100.0);
    }

    #[test]
    fn test_alert_level_serialization() {
        let json = serde_json::to_string(&AlertLevel::NoFace).unwrap();
        assert_eq!(json, "\"NO_FACE\"");
        let level: AlertLevel = serde_json::from_str("\"DANGER\"").unwrap();
        assert_eq!(level, AlertLevel::Danger);
        assert_eq!(AlertLevel::Warning.to_string(), "WARNING");
    }
}
