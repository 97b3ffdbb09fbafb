use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::pipeline::face_detection_processor::{FaceDetectionProcessor, FrameOutcome};
use crate::shared::frame::Frame;

const DEFAULT_QUEUE_CAPACITY: usize = 2;

/// Counters reported when the worker shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub submitted: usize,
    /// Rejected by `submit` because the queue was full.
    pub dropped: usize,
    pub processed: usize,
    pub skipped: usize,
    pub disabled: usize,
    /// Turned away because another caller was mid-frame on the same processor.
    pub busy: usize,
}

impl WorkerStats {
    /// Frames that left the worker one way or another.
    pub fn accounted(&self) -> usize {
        self.dropped + self.processed + self.skipped + self.disabled + self.busy
    }
}

/// Dedicated frame-processing context.
///
/// Layout: `capture thread → bounded queue → worker [process_frame]`
///
/// `submit` never blocks: a slow detector makes the queue fill up and
/// excess frames are dropped, so the capture/render path keeps its pace.
pub struct ThreadedFrameWorker {
    tx: Option<Sender<Frame>>,
    handle: Option<JoinHandle<WorkerStats>>,
    submitted: usize,
    dropped: Arc<AtomicUsize>,
}

impl ThreadedFrameWorker {
    pub fn spawn(processor: Arc<FaceDetectionProcessor>) -> std::io::Result<Self> {
        Self::with_capacity(processor, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        processor: Arc<FaceDetectionProcessor>,
        capacity: usize,
    ) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded::<Frame>(capacity.max(1));
        let handle = std::thread::Builder::new()
            .name("blink-detection".into())
            .spawn(move || {
                let mut stats = WorkerStats::default();
                for frame in rx {
                    match processor.process_frame(&frame) {
                        FrameOutcome::Processed { .. } => stats.processed += 1,
                        FrameOutcome::Skipped => stats.skipped += 1,
                        FrameOutcome::Disabled => stats.disabled += 1,
                        FrameOutcome::Busy => stats.busy += 1,
                    }
                }
                stats
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            submitted: 0,
            dropped: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Queues a frame. Returns `false` if it was dropped.
    pub fn submit(&mut self, frame: Frame) -> bool {
        self.submitted += 1;
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                log::debug!("Frame {}: worker busy, dropping", frame.index());
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Like `submit` but waits for queue space. For offline replays where
    /// every frame must be analysed.
    pub fn submit_blocking(&mut self, frame: Frame) -> bool {
        self.submitted += 1;
        match self.tx.as_ref() {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Drains queued frames, stops the worker and returns its counters.
    pub fn shutdown(mut self) -> Result<WorkerStats, Box<dyn std::error::Error>> {
        self.finish()
    }

    fn finish(&mut self) -> Result<WorkerStats, Box<dyn std::error::Error>> {
        drop(self.tx.take());
        let Some(handle) = self.handle.take() else {
            return Ok(WorkerStats::default());
        };
        let mut stats = handle
            .join()
            .map_err(|_| "Blink detection thread panicked")?;
        stats.submitted = self.submitted;
        stats.dropped = self.dropped.load(Ordering::Relaxed);
        Ok(stats)
    }
}

impl Drop for ThreadedFrameWorker {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blink::domain::blink_event::BlinkEye;
    use crate::blink::domain::eye_aspect_ratio::fixtures::eye_with_ear;
    use crate::detection::domain::detected_face::DetectedFace;
    use crate::detection::domain::landmark_detector::{DetectorError, LandmarkDetector};
    use crate::detection::infrastructure::replay_landmark_detector::ReplayLandmarkDetector;
    use crate::pipeline::event_sink::SinkHandle;
    use crate::pipeline::infrastructure::channel_event_sink::{ChannelEventSink, ProcessorEvent};
    use crate::pipeline::processor_config::ProcessorConfig;
    use crossbeam_channel::Receiver;
    use std::collections::HashMap;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 4], 2, 2, 1, index)
    }

    fn processor(ears: &[f64]) -> Arc<FaceDetectionProcessor> {
        let recording: HashMap<usize, Result<Vec<DetectedFace>, String>> = ears
            .iter()
            .enumerate()
            .map(|(i, &ear)| {
                let face = DetectedFace::new(
                    0,
                    eye_with_ear(100.0, 100.0, ear),
                    eye_with_ear(160.0, 100.0, ear),
                    0.9,
                );
                (i, Ok(vec![face]))
            })
            .collect();
        let detector = ReplayLandmarkDetector::new(Arc::new(recording));
        Arc::new(FaceDetectionProcessor::new(Box::new(detector), ProcessorConfig::default()).unwrap())
    }

    #[test]
    fn test_blocking_submit_processes_every_frame_in_order() {
        let p = processor(&[0.3, 0.1, 0.3, 0.1, 0.3]);
        let (sink, rx) = ChannelEventSink::unbounded(false);
        let sink = Arc::new(sink);
        p.set_event_sink(SinkHandle::new(&sink));

        let mut worker = ThreadedFrameWorker::spawn(p.clone()).unwrap();
        for i in 0..5 {
            assert!(worker.submit_blocking(frame(i)));
        }
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.submitted, 5);
        assert_eq!(stats.processed, 5);
        assert_eq!(stats.dropped, 0);
        let both: Vec<usize> = rx
            .try_iter()
            .filter_map(|e| match e {
                ProcessorEvent::Blink(b) if b.eye == BlinkEye::Both => Some(b.frame_index),
                _ => None,
            })
            .collect();
        assert_eq!(both, vec![2, 4]);
    }

    #[test]
    fn test_disabled_frames_are_counted() {
        let p = processor(&[]);
        p.set_enabled(false);

        let mut worker = ThreadedFrameWorker::spawn(p).unwrap();
        for i in 0..3 {
            worker.submit_blocking(frame(i));
        }
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.disabled, 3);
        assert_eq!(stats.processed, 0);
    }

    #[test]
    fn test_submit_never_blocks() {
        let p = processor(&[]);
        let mut worker = ThreadedFrameWorker::with_capacity(p, 1).unwrap();

        let accepted = (0..200).filter(|&i| worker.submit(frame(i))).count();
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.submitted, 200);
        assert_eq!(stats.dropped, 200 - accepted);
        assert_eq!(stats.processed, accepted);
        assert_eq!(stats.accounted(), stats.submitted);
    }

    #[test]
    fn test_frames_from_another_producer_are_counted_busy() {
        let (entered_tx, entered) = crossbeam_channel::unbounded::<()>();
        let (release, release_rx) = crossbeam_channel::unbounded::<()>();
        struct Blocking(Sender<()>, Receiver<()>);
        impl LandmarkDetector for Blocking {
            fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, DetectorError> {
                if frame.index() == 100 {
                    let _ = self.0.send(());
                    let _ = self.1.recv();
                }
                Ok(Vec::new())
            }
        }
        let p = Arc::new(
            FaceDetectionProcessor::new(
                Box::new(Blocking(entered_tx, release_rx)),
                ProcessorConfig::default(),
            )
            .unwrap(),
        );

        let outside = {
            let p = p.clone();
            std::thread::spawn(move || p.process_frame(&frame(100)))
        };
        entered.recv().unwrap();

        let mut worker = ThreadedFrameWorker::spawn(p).unwrap();
        worker.submit_blocking(frame(0));
        worker.submit_blocking(frame(1));
        // Let the worker run both frames into the busy processor.
        std::thread::sleep(std::time::Duration::from_millis(50));
        release.send(()).unwrap();
        outside.join().unwrap();
        let stats = worker.shutdown().unwrap();

        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.accounted(), 2);
        assert_eq!(stats.busy + stats.processed, 2);
    }
}
