use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_BLINK_THRESHOLD, DEFAULT_FRAME_SKIP_COUNT, DEFAULT_MAX_DISPLACEMENT,
    DEFAULT_MAX_UNSEEN_FRAMES, DEFAULT_MIN_CLOSED_FRAMES, DEFAULT_MIN_CONFIDENCE,
};
use crate::shared::error::ProcessingError;

/// Host-tunable processor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub enabled: bool,
    pub frame_skip_count: usize,
    pub blink_threshold: f64,
    pub min_confidence: f64,
    pub min_closed_frames: usize,
    pub max_displacement: f64,
    pub max_unseen_frames: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_skip_count: DEFAULT_FRAME_SKIP_COUNT,
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_closed_frames: DEFAULT_MIN_CLOSED_FRAMES,
            max_displacement: DEFAULT_MAX_DISPLACEMENT,
            max_unseen_frames: DEFAULT_MAX_UNSEEN_FRAMES,
        }
    }
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<(), ProcessingError> {
        if !(self.blink_threshold.is_finite() && self.blink_threshold > 0.0) {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "blink_threshold must be a finite value > 0, got {}",
                self.blink_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.min_closed_frames == 0 {
            return Err(ProcessingError::InvalidConfiguration(
                "min_closed_frames must be >= 1".into(),
            ));
        }
        if !(self.max_displacement.is_finite() && self.max_displacement > 0.0) {
            return Err(ProcessingError::InvalidConfiguration(format!(
                "max_displacement must be a finite value > 0, got {}",
                self.max_displacement
            )));
        }
        Ok(())
    }
}

/// Versioned, atomically swapped configuration snapshot.
///
/// Writers replace the whole `Arc`; readers clone it once per frame, so a
/// frame never sees a half-applied update.
pub struct ConfigStore {
    current: RwLock<Arc<ProcessorConfig>>,
    version: AtomicU64,
}

impl ConfigStore {
    pub fn new(config: ProcessorConfig) -> Result<Self, ProcessingError> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
            version: AtomicU64::new(0),
        })
    }

    pub fn snapshot(&self) -> Arc<ProcessorConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Incremented on every accepted update.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Applies `change` to a copy of the current config and swaps it in if
    /// it validates. On error the previous config stays in place.
    pub fn update<F>(&self, change: F) -> Result<Arc<ProcessorConfig>, ProcessingError>
    where
        F: FnOnce(&mut ProcessorConfig),
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**guard).clone();
        change(&mut next);
        next.validate()?;
        let next = Arc::new(next);
        *guard = next.clone();
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(next)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(ProcessorConfig::default())),
            version: AtomicU64::new(0),
        }
    }
}
