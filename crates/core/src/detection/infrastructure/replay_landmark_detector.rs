use std::collections::HashMap;
use std::sync::Arc;

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::landmark_detector::{DetectorError, LandmarkDetector};
use crate::detection::infrastructure::landmark_trace::TraceFrame;
use crate::shared::frame::Frame;

/// Replays recorded detector output by frame index.
///
/// Lets a captured session be re-run through the blink pipeline with
/// different thresholds without the original model. Frames missing from
/// the recording yield no faces; recorded failures are returned as errors.
pub struct ReplayLandmarkDetector {
    recording: Arc<HashMap<usize, Result<Vec<DetectedFace>, String>>>,
    calls: usize,
}

impl ReplayLandmarkDetector {
    pub fn new(recording: Arc<HashMap<usize, Result<Vec<DetectedFace>, String>>>) -> Self {
        Self {
            recording,
            calls: 0,
        }
    }

    pub fn from_trace(frames: &[TraceFrame]) -> Self {
        let recording = frames
            .iter()
            .map(|f| {
                let result = match &f.error {
                    Some(message) => Err(message.clone()),
                    None => Ok(f.faces.clone()),
                };
                (f.index, result)
            })
            .collect();
        Self::new(Arc::new(recording))
    }

    /// Number of `detect` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl LandmarkDetector for ReplayLandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectorError> {
        self.calls += 1;
        match self.recording.get(&frame.index()) {
            Some(Ok(faces)) => Ok(faces.clone()),
            Some(Err(message)) => Err(message.clone().into()),
            None => Ok(Vec::new()),
        }
    }
}
