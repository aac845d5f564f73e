//! Detector state tracking

use serde::Serialize;

/// Temporal state of one classifier (tracked over frames)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectorState {
    /// Consecutive frames with the eyes closed
    pub eye_closed_frames: u32,

    /// Consecutive frames with the mouth open past the yawn threshold
    pub yawn_frames: u32,

    /// Accumulated drowsiness score (never negative)
    pub drowsiness_score: f64,

    /// Counted yawns still remembered
    pub total_yawns: u32,

    /// Frames since the last counted yawn, meaningful while `total_yawns > 0`
    pub frames_since_last_yawn: u32,

    /// Set by any DANGER classification, cleared by a SAFE one or a reset
    pub alert_active: bool,

    /// Remaining grace frames during which scoring is suppressed
    pub pause_scoring_frames: u32,
}

impl DetectorState {
    /// Zero every counter and arm the grace period
    pub fn reset(&mut self, grace_frames: u32) {
        *self = Self {
            pause_scoring_frames: grace_frames,
            ..Self::default()
        };
    }

    /// Whether scoring is currently suppressed
    pub fn in_grace_period(&self) -> bool {
        self.pause_scoring_frames > 0
    }
}
