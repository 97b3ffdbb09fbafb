use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use crate::blink::domain::blink_event::{BlinkEvent, BlinkEye, EyeReport, FaceReport, FaceSnapshot};
use crate::blink::domain::blink_state_machine::BlinkPhase;
use crate::blink::domain::eye_aspect_ratio::compute_ear;
use crate::blink::domain::eye_state::EyeState;
use crate::blink::domain::face_blink_state::FaceBlinkState;
use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::detection::infrastructure::centroid_tracker::CentroidTracker;
use crate::pipeline::event_sink::SinkHandle;
use crate::pipeline::frame_throttle::FrameThrottle;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::processor_chain::FrameProcessor;
use crate::pipeline::processor_config::{ConfigStore, ProcessorConfig};
use crate::shared::error::ProcessingError;
use crate::shared::frame::Frame;
use crate::shared::point::Point;

/// What `process_frame` did with a frame.
#[derive(Debug, PartialEq)]
pub enum FrameOutcome {
    Disabled,
    /// Dropped by the throttle.
    Skipped,
    /// Another `process_frame` call was still in flight.
    Busy,
    Processed {
        faces: usize,
        events: Vec<BlinkEvent>,
    },
}

impl FrameOutcome {
    pub fn was_processed(&self) -> bool {
        matches!(self, FrameOutcome::Processed { .. })
    }
}

/// Everything `process_frame` and `reset` mutate, behind one lock.
///
/// The detector lives outside it so queries and `reset` never wait on a
/// detection.
struct ProcessorState {
    throttle: FrameThrottle,
    tracker: CentroidTracker<FaceBlinkState>,
    logger: Box<dyn PipelineLogger>,
}

/// Turns a live frame stream into blink events.
///
/// Share it as `Arc<FaceDetectionProcessor>`: one context feeds frames
/// through `process_frame` while a control context toggles, retunes or
/// resets it. Each frame reads one configuration snapshot. Track state
/// survives disable/enable and is only cleared by `reset` or eviction.
///
/// Only a second concurrent `process_frame` is turned away (`Busy`); queries
/// and control calls just take the state lock for a short update.
pub struct FaceDetectionProcessor {
    config: ConfigStore,
    in_flight: AtomicBool,
    detector: Mutex<Box<dyn LandmarkDetector>>,
    state: Mutex<ProcessorState>,
    sink: RwLock<SinkHandle>,
}

/// Marks a frame as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FaceDetectionProcessor {
    pub fn new(
        detector: Box<dyn LandmarkDetector>,
        config: ProcessorConfig,
    ) -> Result<Self, ProcessingError> {
        let tracker = CentroidTracker::new(config.max_displacement, config.max_unseen_frames);
        Ok(Self {
            config: ConfigStore::new(config)?,
            in_flight: AtomicBool::new(false),
            detector: Mutex::new(detector),
            state: Mutex::new(ProcessorState {
                throttle: FrameThrottle::new(),
                tracker,
                logger: Box::new(NullPipelineLogger),
            }),
            sink: RwLock::new(SinkHandle::detached()),
        })
    }

    pub fn with_event_sink(self, sink: SinkHandle) -> Self {
        self.set_event_sink(sink);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .logger = logger;
        self
    }

    pub fn set_event_sink(&self, sink: SinkHandle) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    pub fn set_enabled(&self, enabled: bool) {
        if let Err(e) = self.config.update(|c| c.enabled = enabled) {
            log::error!("Failed to toggle blink detection: {e}");
            return;
        }
        log::info!(
            "Blink detection {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.config.snapshot().enabled
    }

    pub fn set_frame_skip_count(&self, count: usize) -> Result<(), ProcessingError> {
        self.config.update(|c| c.frame_skip_count = count)?;
        Ok(())
    }

    pub fn set_blink_threshold(&self, threshold: f64) -> Result<(), ProcessingError> {
        self.config.update(|c| c.blink_threshold = threshold)?;
        Ok(())
    }

    pub fn set_min_confidence(&self, floor: f64) -> Result<(), ProcessingError> {
        self.config.update(|c| c.min_confidence = floor)?;
        Ok(())
    }

    pub fn set_min_closed_frames(&self, frames: usize) -> Result<(), ProcessingError> {
        self.config.update(|c| c.min_closed_frames = frames)?;
        Ok(())
    }

    /// Replaces the whole configuration at once.
    pub fn update_config(&self, config: ProcessorConfig) -> Result<(), ProcessingError> {
        self.config.update(|c| *c = config)?;
        Ok(())
    }

    pub fn config(&self) -> Arc<ProcessorConfig> {
        self.config.snapshot()
    }

    /// Drops all tracks and blink counters and rewinds the throttle.
    /// Configuration, including `enabled`, is untouched. A frame whose
    /// detection is running applies its results to the cleared state.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.tracker.clear();
        state.throttle.reset();
        state.logger.info("Blink tracking reset");
    }

    pub fn tracked_slots(&self) -> Vec<usize> {
        self.lock_state().tracker.iter().map(|t| t.slot).collect()
    }

    pub fn blink_count(&self, slot: usize, eye: BlinkEye) -> Option<u32> {
        self.lock_state()
            .tracker
            .get(slot)
            .map(|t| t.state.machine(eye).blink_count())
    }

    pub fn phase(&self, slot: usize, eye: BlinkEye) -> Option<BlinkPhase> {
        self.lock_state()
            .tracker
            .get(slot)
            .map(|t| t.state.machine(eye).phase())
    }

    /// Flushes the logger's end-of-session summary.
    pub fn log_summary(&self) {
        self.lock_state().logger.summary();
    }

    /// Runs one frame through the pipeline.
    ///
    /// Per-frame anomalies (detector errors, low confidence, missing eye
    /// landmarks) degrade to "no signal" and never touch accumulated state.
    /// Events are emitted after the state lock is released, so a sink may
    /// call back into the control surface.
    pub fn process_frame(&self, frame: &Frame) -> FrameOutcome {
        let config = self.config.snapshot();
        if !config.enabled {
            return FrameOutcome::Disabled;
        }

        let Some(_in_flight) = InFlight::enter(&self.in_flight) else {
            log::debug!("Frame {}: previous frame still in flight", frame.index());
            return FrameOutcome::Busy;
        };

        if !self.lock_state().throttle.should_process(config.frame_skip_count) {
            return FrameOutcome::Skipped;
        }

        let detect_start = Instant::now();
        let detected = self
            .detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detect(frame);
        let faces = match detected {
            Ok(faces) => faces,
            Err(e) => {
                let err = ProcessingError::DetectorFailure(e.to_string());
                log::warn!("Frame {}: {err}", frame.index());
                Vec::new()
            }
        };
        let detect_ms = detect_start.elapsed().as_secs_f64() * 1000.0;

        let mut state = self.lock_state();
        let track_start = Instant::now();
        let (events, snapshots) = track_and_measure(&mut state, &config, frame, &faces);
        let track_ms = track_start.elapsed().as_secs_f64() * 1000.0;

        state.logger.timing("detect", detect_ms);
        state.logger.timing("track", track_ms);
        state.logger.metric("faces", snapshots.len() as f64);
        state.logger.metric("blinks", events.len() as f64);
        state.logger.frame_processed(frame.index());
        drop(state);

        let report = FaceReport {
            frame_index: frame.index(),
            timestamp: frame.timestamp(),
            frame_width: frame.width(),
            frame_height: frame.height(),
            faces: snapshots,
        };
        let sink = self
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for event in &events {
            if !sink.emit_blink(event) {
                log::trace!("No event sink attached; dropping blink for slot {}", event.track_slot);
            }
        }
        sink.emit_faces(&report);

        FrameOutcome::Processed {
            faces: report.faces.len(),
            events,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ProcessorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FrameProcessor for FaceDetectionProcessor {
    /// Analysis only; the frame is passed on untouched.
    fn process(&self, frame: Frame) -> Option<Frame> {
        self.process_frame(&frame);
        Some(frame)
    }
}

/// Associates detections with track slots and feeds each slot's blink
/// machines. Returns blink events in detection order plus face snapshots.
fn track_and_measure(
    state: &mut ProcessorState,
    config: &ProcessorConfig,
    frame: &Frame,
    faces: &[DetectedFace],
) -> (Vec<BlinkEvent>, Vec<FaceSnapshot>) {
    let mut candidates: Vec<(usize, Point)> = Vec::with_capacity(faces.len());
    for (i, face) in faces.iter().enumerate() {
        if face.confidence.is_nan() || face.confidence < config.min_confidence {
            let err = ProcessingError::LowConfidenceDetection {
                confidence: face.confidence,
                floor: config.min_confidence,
            };
            log::debug!("Frame {}: face {}: {err}", frame.index(), face.face_id);
            continue;
        }
        match face.eye_centroid() {
            Some(centroid) => candidates.push((i, centroid)),
            None => log::debug!(
                "Frame {}: face {} has no landmarks to track",
                frame.index(),
                face.face_id
            ),
        }
    }

    state
        .tracker
        .set_limits(config.max_displacement, config.max_unseen_frames);
    let assignments = state.tracker.update(&candidates, frame.index());

    let mut events = Vec::new();
    let mut snapshots = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let face = &faces[assignment.det_index];
        let left = measure_eye(&face.left_eye, frame, assignment.slot, BlinkEye::Left);
        let right = measure_eye(&face.right_eye, frame, assignment.slot, BlinkEye::Right);

        let Some(tracked) = state.tracker.get_mut(assignment.slot) else {
            continue;
        };
        let blinks = tracked.state.observe(
            left,
            right,
            config.blink_threshold,
            config.min_closed_frames,
        );
        events.extend(blinks.into_iter().map(|b| BlinkEvent {
            track_slot: assignment.slot,
            eye: b.eye,
            timestamp: frame.timestamp(),
            frame_index: frame.index(),
            ear_at_detection: b.ear,
            blink_count: b.blink_count,
        }));

        let eye_report = |ear: Option<f64>, eye: BlinkEye| EyeReport {
            state: ear.map(|e| EyeState::from_ear(e, config.blink_threshold)),
            blink_count: tracked.state.machine(eye).blink_count(),
        };
        snapshots.push(FaceSnapshot {
            track_slot: assignment.slot,
            confidence: face.confidence,
            bounds: face.bounds,
            head_pose: face.head_pose,
            left_eye: eye_report(left, BlinkEye::Left),
            right_eye: eye_report(right, BlinkEye::Right),
            blink_count: tracked.state.machine(BlinkEye::Both).blink_count(),
        });
    }
    (events, snapshots)
}

fn measure_eye(points: &[Point], frame: &Frame, slot: usize, eye: BlinkEye) -> Option<f64> {
    match compute_ear(points) {
        Ok(ear) => Some(ear),
        Err(e) => {
            log::debug!("Frame {}: slot {slot} {eye} eye: {e}", frame.index());
            None
        }
    }
}
