use crate::detection::domain::detected_face::DetectedFace;
use crate::shared::frame::Frame;

pub type DetectorError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for the face/eye landmark model.
///
/// Implementations may be stateful (e.g., warm model sessions), hence
/// `&mut self`. They must not retain the frame past the call.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectorError>;
}
