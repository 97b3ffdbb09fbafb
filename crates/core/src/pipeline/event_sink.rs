use std::sync::{Arc, Weak};

use crate::blink::domain::blink_event::{BlinkEvent, FaceReport};

/// Host-side receiver of processor output.
///
/// Calls are fire-and-forget and happen on the frame-processing thread, in
/// emission order. Implementations that hand events to another thread
/// (e.g. a UI loop) own that dispatch.
pub trait EventSink: Send + Sync {
    fn emit_blink(&self, event: &BlinkEvent);

    /// Per-frame face snapshot. Default: ignored.
    fn emit_faces(&self, _report: &FaceReport) {}
}

/// Non-owning handle to the host's sink.
///
/// The processor never keeps the sink alive; once the host drops it,
/// emissions become silent no-ops.
#[derive(Clone)]
pub struct SinkHandle {
    sink: Option<Weak<dyn EventSink>>,
}

impl SinkHandle {
    pub fn new<S: EventSink + 'static>(sink: &Arc<S>) -> Self {
        let sink: Arc<dyn EventSink> = sink.clone();
        Self {
            sink: Some(Arc::downgrade(&sink)),
        }
    }

    pub fn detached() -> Self {
        Self { sink: None }
    }

    pub fn is_attached(&self) -> bool {
        self.sink.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    /// Returns `false` when the sink is gone and the event was dropped.
    pub fn emit_blink(&self, event: &BlinkEvent) -> bool {
        match self.upgrade() {
            Some(sink) => {
                sink.emit_blink(event);
                true
            }
            None => false,
        }
    }

    pub fn emit_faces(&self, report: &FaceReport) -> bool {
        match self.upgrade() {
            Some(sink) => {
                sink.emit_faces(report);
                true
            }
            None => false,
        }
    }

    fn upgrade(&self) -> Option<Arc<dyn EventSink>> {
        self.sink.as_ref().and_then(Weak::upgrade)
    }
}

impl Default for SinkHandle {
    fn default() -> Self {
        Self::detached()
    }
}
