use thiserror::Error;

/// Failures that can arise while turning a frame into blink events.
///
/// Only `InvalidConfiguration` ever reaches the host. The per-frame
/// variants are absorbed by the processor and degrade to "no signal this
/// frame".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    #[error("insufficient eye landmarks: need {required}, got {actual}")]
    InsufficientLandmarks { required: usize, actual: usize },

    #[error("detection confidence {confidence:.2} below floor {floor:.2}")]
    LowConfidenceDetection { confidence: f64, floor: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("landmark detector failed: {0}")]
    DetectorFailure(String),
}
