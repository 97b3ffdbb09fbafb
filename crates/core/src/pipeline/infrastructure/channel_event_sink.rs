use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::blink::domain::blink_event::{BlinkEvent, FaceReport};
use crate::pipeline::event_sink::EventSink;

/// Message delivered to the host's event loop.
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessorEvent {
    Blink(BlinkEvent),
    Faces(FaceReport),
}

/// Forwards processor output across threads, e.g. to a UI loop.
///
/// Sending never blocks the frame thread: when the queue is full the event
/// is dropped and logged. Face reports are optional since they arrive on
/// every processed frame.
pub struct ChannelEventSink {
    tx: Sender<ProcessorEvent>,
    forward_faces: bool,
}

impl ChannelEventSink {
    pub fn bounded(capacity: usize, forward_faces: bool) -> (Self, Receiver<ProcessorEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx, forward_faces }, rx)
    }

    pub fn unbounded(forward_faces: bool) -> (Self, Receiver<ProcessorEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx, forward_faces }, rx)
    }

    fn send(&self, event: ProcessorEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::warn!("Event queue full; dropping event"),
            Err(TrySendError::Disconnected(_)) => log::trace!("Event receiver gone"),
        }
    }
}

impl EventSink for ChannelEventSink {
    fn emit_blink(&self, event: &BlinkEvent) {
        self.send(ProcessorEvent::Blink(event.clone()));
    }

    fn emit_faces(&self, report: &FaceReport) {
        if self.forward_faces {
            self.send(ProcessorEvent::Faces(report.clone()));
        }
    }
}
