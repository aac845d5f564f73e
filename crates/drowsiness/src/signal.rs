//! Per-frame signal and landmark ratio formulas
//!
//! The ratios are computed from 2D landmark coordinates:
//! - EAR = (|p1-p5| + |p2-p4|) / (2 * |p0-p3|), points ordered
//!   `[outer, top1, top2, inner, bottom1, bottom2]`
//! - MAR = (|p1-p7| + |p2-p6| + |p3-p5|) / (2 * |p0-p4|), points ordered
//!   `[left corner, top1, top2, top3, right corner, bottom1, bottom2, bottom3]`

use serde::{Deserialize, Serialize};

/// Horizontal landmark distances below this are treated as degenerate
const MIN_WIDTH: f64 = 1e-6;

/// Eye and mouth openness for one video frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSignal {
    pub ear: f64,
    pub mar: f64,
}

impl FrameSignal {
    pub fn new(ear: f64, mar: f64) -> Self {
        Self { ear, mar }
    }

    /// Compute the signal from eye and mouth landmarks
    pub fn from_landmarks(left_eye: &[Point; 6], right_eye: &[Point; 6], mouth: &[Point]) -> Self {
        Self {
            ear: average_ear(left_eye, right_eye),
            mar: mouth_aspect_ratio(mouth),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.ear.is_finite() && self.mar.is_finite()
    }
}

/// 2D landmark in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Eye Aspect Ratio for one eye. Returns 0.0 for a degenerate eye width.
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> f64 {
    let vertical = eye[1].distance(&eye[5]) + eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);
    if horizontal < MIN_WIDTH {
        return 0.0;
    }
    vertical / (2.0 * horizontal)
}

/// Mean EAR of both eyes
pub fn average_ear(left: &[Point; 6], right: &[Point; 6]) -> f64 {
    (eye_aspect_ratio(left) + eye_aspect_ratio(right)) / 2.0
}

/// Mouth Aspect Ratio
///
/// Returns 0.0 when fewer than 8 points are given or the mouth width is
/// degenerate.
pub fn mouth_aspect_ratio(mouth: &[Point]) -> f64 {
    if mouth.len() < 8 {
        return 0.0;
    }
    let vertical = mouth[1].distance(&mouth[7])
        + mouth[2].distance(&mouth[6])
        + mouth[3].distance(&mouth[5]);
    let horizontal = mouth[0].distance(&mouth[4]);
    if horizontal < MIN_WIDTH {
        return 0.0;
    }
    vertical / (2.0 * horizontal)
}
