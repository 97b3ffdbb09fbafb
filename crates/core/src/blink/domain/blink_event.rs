use std::time::Duration;

use serde::Serialize;

use crate::blink::domain::eye_state::EyeState;
use crate::detection::domain::detected_face::{BoundingBox, HeadPose};

/// Which signal produced a blink.
///
/// `Both` comes from the combined per-face signal and fires only when both
/// eyes were closed at the same time; hosts pick the policy they want.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlinkEye {
    Left,
    Right,
    Both,
}

impl BlinkEye {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlinkEye::Left => "left",
            BlinkEye::Right => "right",
            BlinkEye::Both => "both",
        }
    }
}

impl std::fmt::Display for BlinkEye {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlinkEvent {
    pub track_slot: usize,
    pub eye: BlinkEye,
    /// Capture timestamp of the frame on which the eye re-opened.
    pub timestamp: Duration,
    pub frame_index: usize,
    /// EAR of the re-opening sample.
    pub ear_at_detection: f64,
    /// Running count for this slot and eye, including this blink.
    pub blink_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EyeReport {
    /// `None` when no usable landmarks were reported this frame.
    pub state: Option<EyeState>,
    pub blink_count: u32,
}

/// Snapshot of one tracked face on a processed frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceSnapshot {
    pub track_slot: usize,
    pub confidence: f64,
    pub bounds: Option<BoundingBox>,
    pub head_pose: Option<HeadPose>,
    pub left_eye: EyeReport,
    pub right_eye: EyeReport,
    pub blink_count: u32,
}

/// Everything seen on one processed frame, emitted after its blink events.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceReport {
    pub frame_index: usize,
    pub timestamp: Duration,
    pub frame_width: u32,
    pub frame_height: u32,
    pub faces: Vec<FaceSnapshot>,
}
