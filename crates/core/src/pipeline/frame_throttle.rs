/// Cadence gate: processes one frame, then skips `skip_count` frames.
///
/// The skip count is passed per call so a configuration change applies on
/// the very next frame. Knows nothing about detection results.
#[derive(Clone, Debug, Default)]
pub struct FrameThrottle {
    since_processed: Option<usize>,
}

impl FrameThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_process(&mut self, skip_count: usize) -> bool {
        match self.since_processed {
            Some(skipped) if skipped < skip_count => {
                self.since_processed = Some(skipped + 1);
                false
            }
            _ => {
                self.since_processed = Some(0);
                true
            }
        }
    }

    /// The next frame after a reset is always processed.
    pub fn reset(&mut self) {
        self.since_processed = None;
    }
}
