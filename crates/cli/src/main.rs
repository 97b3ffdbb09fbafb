mod output;
mod settings;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use blinkwatch_core::detection::infrastructure::landmark_trace::{read_trace, TraceFrame};
use blinkwatch_core::detection::infrastructure::replay_landmark_detector::ReplayLandmarkDetector;
use blinkwatch_core::pipeline::event_sink::SinkHandle;
use blinkwatch_core::pipeline::face_detection_processor::FaceDetectionProcessor;
use blinkwatch_core::pipeline::infrastructure::threaded_frame_worker::ThreadedFrameWorker;
use blinkwatch_core::pipeline::pipeline_logger::StatsPipelineLogger;
use blinkwatch_core::shared::frame::Frame;

use output::EventPrinter;
use settings::{BlinkPolicy, OutputFormat, Settings};

/// Replays a recorded face-landmark trace and reports eye blinks.
#[derive(Parser)]
#[command(name = "blinkwatch")]
struct Cli {
    /// Landmark trace (JSON lines, one frame per line).
    trace: PathBuf,

    /// Settings file (default: <config dir>/blinkwatch/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// EAR below which an eye counts as closed.
    #[arg(long)]
    threshold: Option<f64>,

    /// Frames skipped between analysed frames (0 = analyse every frame).
    #[arg(long)]
    skip_frames: Option<usize>,

    /// Detections below this confidence are ignored (0.0-1.0).
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Closed samples required before a re-opening counts as a blink.
    #[arg(long)]
    min_closed_frames: Option<usize>,

    /// Output format for blink events.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Which blink events to print.
    #[arg(long, value_enum)]
    blink_policy: Option<BlinkPolicy>,
}

impl Cli {
    /// Defaults, then the settings file, then flags.
    fn resolve_settings(&self) -> Result<Settings, Box<dyn std::error::Error>> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load(),
        };
        if let Some(threshold) = self.threshold {
            settings.processor.blink_threshold = threshold;
        }
        if let Some(skip) = self.skip_frames {
            settings.processor.frame_skip_count = skip;
        }
        if let Some(floor) = self.min_confidence {
            settings.processor.min_confidence = floor;
        }
        if let Some(frames) = self.min_closed_frames {
            settings.processor.min_closed_frames = frames;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(policy) = self.blink_policy {
            settings.blink_policy = policy;
        }
        settings.processor.enabled = true;
        Ok(settings)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;

    let file = File::open(&cli.trace)
        .map_err(|e| format!("Cannot open trace {}: {e}", cli.trace.display()))?;
    let frames = read_trace(BufReader::new(file))?;
    log::info!("Loaded {} frames from {}", frames.len(), cli.trace.display());

    let printer = Arc::new(EventPrinter::new(
        std::io::stdout(),
        settings.format,
        settings.blink_policy,
    ));
    let processor = Arc::new(
        FaceDetectionProcessor::new(
            Box::new(ReplayLandmarkDetector::from_trace(&frames)),
            settings.processor.clone(),
        )?
        .with_event_sink(SinkHandle::new(&printer))
        .with_logger(Box::new(StatsPipelineLogger::default())),
    );

    let mut worker = ThreadedFrameWorker::spawn(processor.clone())?;
    for trace_frame in &frames {
        worker.submit_blocking(blank_frame(trace_frame));
    }
    let stats = worker.shutdown()?;
    log::info!(
        "Analysed {} of {} frames ({} skipped)",
        stats.processed,
        stats.submitted,
        stats.skipped
    );

    processor.log_summary();
    let totals = printer.totals();
    eprintln!(
        "{} faces tracked at end; blinks: both {}, left {}, right {}",
        processor.tracked_slots().len(),
        totals.both,
        totals.left,
        totals.right
    );
    Ok(())
}

/// Traces carry landmarks only, so replayed frames have no pixels to speak of.
fn blank_frame(trace_frame: &TraceFrame) -> Frame {
    let width = trace_frame.width;
    let height = trace_frame.height;
    Frame::new(
        vec![0; width as usize * height as usize],
        width,
        height,
        1,
        trace_frame.index,
    )
    .with_timestamp(trace_frame.timestamp())
}
