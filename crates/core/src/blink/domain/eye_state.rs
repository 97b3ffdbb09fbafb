use serde::Serialize;

/// One eye's measurement for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EyeState {
    pub ear: f64,
    pub is_closed: bool,
}

impl EyeState {
    pub fn from_ear(ear: f64, blink_threshold: f64) -> Self {
        Self {
            ear,
            is_closed: ear < blink_threshold,
        }
    }
}
