use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use blinkwatch_core::blink::domain::blink_event::{BlinkEvent, BlinkEye};
use blinkwatch_core::pipeline::event_sink::EventSink;

use crate::settings::{BlinkPolicy, OutputFormat};

#[derive(Serialize)]
struct EventLine<'a> {
    frame: usize,
    timestamp_ms: u128,
    slot: usize,
    eye: &'a str,
    ear: f64,
    count: u32,
}

pub fn format_event(event: &BlinkEvent, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(format!(
            "[{:>8.3}s] frame {:>5}  face {}  {:<5} blink #{}  (EAR {:.3})",
            event.timestamp.as_secs_f64(),
            event.frame_index,
            event.track_slot,
            event.eye.as_str(),
            event.blink_count,
            event.ear_at_detection,
        )),
        OutputFormat::Json => serde_json::to_string(&EventLine {
            frame: event.frame_index,
            timestamp_ms: event.timestamp.as_millis(),
            slot: event.track_slot,
            eye: event.eye.as_str(),
            ear: event.ear_at_detection,
            count: event.blink_count,
        }),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventTotals {
    pub left: usize,
    pub right: usize,
    pub both: usize,
    pub printed: usize,
}

/// Writes accepted blink events, one per line.
pub struct EventPrinter<W: Write + Send> {
    format: OutputFormat,
    policy: BlinkPolicy,
    inner: Mutex<(W, EventTotals)>,
}

impl<W: Write + Send> EventPrinter<W> {
    pub fn new(out: W, format: OutputFormat, policy: BlinkPolicy) -> Self {
        Self {
            format,
            policy,
            inner: Mutex::new((out, EventTotals::default())),
        }
    }

    pub fn totals(&self) -> EventTotals {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).1
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner).0
    }
}

impl<W: Write + Send> EventSink for EventPrinter<W> {
    fn emit_blink(&self, event: &BlinkEvent) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (out, totals) = &mut *guard;
        match event.eye {
            BlinkEye::Left => totals.left += 1,
            BlinkEye::Right => totals.right += 1,
            BlinkEye::Both => totals.both += 1,
        }
        if !self.policy.accepts(event.eye) {
            return;
        }
        let line = match format_event(event, self.format) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Cannot encode event: {e}");
                return;
            }
        };
        if let Err(e) = writeln!(out, "{line}") {
            log::error!("Cannot write event: {e}");
            return;
        }
        totals.printed += 1;
    }
}
