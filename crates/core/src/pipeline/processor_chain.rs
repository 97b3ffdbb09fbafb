use std::sync::Arc;

use crate::shared::frame::Frame;

/// A stage that can inspect or replace a frame on its way to the sink.
pub trait FrameProcessor: Send + Sync {
    /// Returns the frame to pass on, or `None` to abandon this frame's
    /// effects, in which case the chain forwards the original capture.
    fn process(&self, frame: Frame) -> Option<Frame>;
}

/// Downstream consumer of processed frames (encoder, renderer...).
pub trait FrameSink: Send {
    fn on_frame(&mut self, frame: Frame);
}

/// Runs captured frames through processors in order, then hands them on.
///
/// Analysis stages such as the blink processor return the frame untouched,
/// so the video path never waits on anything but the stages themselves.
pub struct ProcessorChain {
    processors: Vec<Arc<dyn FrameProcessor>>,
    sink: Option<Box<dyn FrameSink>>,
}

impl ProcessorChain {
    pub fn new(processors: Vec<Arc<dyn FrameProcessor>>) -> Self {
        Self {
            processors,
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sink = Some(sink);
    }

    /// Keeping the capture around for an abandoned frame is a reference
    /// count bump; pixels are shared, not copied.
    pub fn on_frame_captured(&mut self, frame: Frame) {
        let mut output = frame.clone();
        for processor in &self.processors {
            match processor.process(output) {
                Some(next) => output = next,
                None => {
                    log::debug!("Frame {}: processor abandoned frame", frame.index());
                    output = frame;
                    break;
                }
            }
        }

        match self.sink.as_mut() {
            Some(sink) => sink.on_frame(output),
            None => log::trace!("No frame sink attached; dropping frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Invert;

    impl FrameProcessor for Invert {
        fn process(&self, frame: Frame) -> Option<Frame> {
            let data = frame.data().iter().map(|v| 255 - v).collect();
            Some(Frame::new(data, frame.width(), frame.height(), frame.channels(), frame.index()))
        }
    }

    struct Abandon;

    impl FrameProcessor for Abandon {
        fn process(&self, _frame: Frame) -> Option<Frame> {
            None
        }
    }

    struct Recorder(Arc<Mutex<Vec<Frame>>>);

    impl FrameSink for Recorder {
        fn on_frame(&mut self, frame: Frame) {
            self.0.lock().unwrap().push(frame);
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![10, 20, 30, 40], 2, 2, 1, 7)
    }

    fn chain(processors: Vec<Arc<dyn FrameProcessor>>) -> (ProcessorChain, Arc<Mutex<Vec<Frame>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ProcessorChain::new(processors);
        chain.set_sink(Box::new(Recorder(seen.clone())));
        (chain, seen)
    }

    #[test]
    fn test_processors_apply_in_order() {
        let (mut chain, seen) = chain(vec![Arc::new(Invert), Arc::new(Invert)]);
        chain.on_frame_captured(frame());

        assert_eq!(seen.lock().unwrap()[0].data(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_abandoned_frame_forwards_original() {
        let (mut chain, seen) = chain(vec![Arc::new(Invert), Arc::new(Abandon)]);
        chain.on_frame_captured(frame());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data(), &[10, 20, 30, 40]);
    }

    #[test]
    fn test_forwarded_frames_share_the_capture_buffer() {
        struct Passthrough;
        impl FrameProcessor for Passthrough {
            fn process(&self, frame: Frame) -> Option<Frame> {
                Some(frame)
            }
        }

        let (mut chain, seen) = chain(vec![Arc::new(Passthrough), Arc::new(Abandon)]);
        let captured = frame();
        let pixels = captured.data().as_ptr();
        chain.on_frame_captured(captured);

        assert!(std::ptr::eq(seen.lock().unwrap()[0].data().as_ptr(), pixels));
    }

    #[test]
    fn test_no_sink_does_not_panic() {
        let mut chain = ProcessorChain::new(vec![Arc::new(Invert)]);
        chain.on_frame_captured(frame());
    }
}
