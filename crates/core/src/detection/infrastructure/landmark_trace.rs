//! Recorded landmark traces: one JSON object per line, one line per frame.
//!
//! ```text
//! {"index":0,"timestamp_ms":0,"width":640,"height":480,"faces":[...]}
//! {"index":1,"timestamp_ms":33,"error":"model timeout"}
//! ```
//!
//! A line carrying `error` replays as a detector failure for that frame.

use std::io::BufRead;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detected_face::DetectedFace;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed trace line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub index: usize,
    #[serde(default)]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub faces: Vec<DetectedFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceFrame {
    pub fn timestamp(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }
}

/// Parses a whole trace. Blank lines are ignored; line numbers in errors
/// are 1-based.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Vec<TraceFrame>, TraceError> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str(&line).map_err(|source| TraceError::Parse {
            line: i + 1,
            source,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}
