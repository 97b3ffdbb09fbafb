use std::collections::HashMap;
use std::time::Instant;

/// Observer for per-frame processing statistics.
///
/// Keeps the processor free of any particular output mechanism; hosts
/// plug in whatever reporting they need.
pub trait PipelineLogger: Send {
    /// Called once for every frame that reached the detector.
    fn frame_processed(&mut self, index: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. face count, blinks emitted).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Default for processors built without a logger.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame_processed(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count/sum/max of one timing stage or metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregates stage timings and metrics and reports them through `log`.
///
/// Memory stays constant however long the stream runs: only per-name
/// aggregates are kept. Progress lines are throttled to one per
/// `report_every` processed frames.
pub struct StatsPipelineLogger {
    report_every: usize,
    timings: HashMap<String, Aggregate>,
    metrics: HashMap<String, Aggregate>,
    start_time: Instant,
    frames: usize,
}

impl StatsPipelineLogger {
    pub fn new(report_every: usize) -> Self {
        Self {
            report_every: report_every.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = Vec::new();

        lines.push(format!(
            "Blink pipeline summary ({frames} processed frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, agg) in stages {
            lines.push(format!(
                "  {stage:8}: avg {:6.2}ms  max {:6.2}ms  total {:7.0}ms",
                agg.mean(),
                agg.max,
                agg.sum
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.iter().collect();
        metric_names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, agg) in metric_names {
            lines.push(format!("  {name}: avg {:.2}  total {:.0}", agg.mean(), agg.sum));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<Aggregate> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<Aggregate> {
        self.metrics.get(name).copied()
    }
}

impl Default for StatsPipelineLogger {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PipelineLogger for StatsPipelineLogger {
    fn frame_processed(&mut self, index: usize) {
        self.frames += 1;
        if self.frames % self.report_every == 0 {
            log::info!("Processed {} frames (latest index {index})", self.frames);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.timings, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn record(map: &mut HashMap<String, Aggregate>, name: &str, value: f64) {
    match map.get_mut(name) {
        Some(agg) => agg.record(value),
        None => {
            let mut agg = Aggregate::default();
            agg.record(value);
            map.insert(name.to_string(), agg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.frame_processed(1);
        logger.timing("detect", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_keeps_running_aggregate() {
        let mut logger = StatsPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("track", 0.5);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.sum, 50.0);
        assert_relative_eq!(detect.max, 30.0);
        assert_eq!(logger.timings_for("track").unwrap().count, 1);
        assert!(logger.timings_for("encode").is_none());
    }

    #[test]
    fn test_metric_mean() {
        let mut logger = StatsPipelineLogger::new(10);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        assert_relative_eq!(logger.metrics_for("faces").unwrap().mean(), 1.5);
    }

    #[test]
    fn test_long_stream_stays_bounded() {
        let mut logger = StatsPipelineLogger::new(1000);
        for i in 0..108_000 {
            logger.timing("detect", (i % 10) as f64);
            logger.metric("faces", 1.0);
            logger.info("tick");
            logger.frame_processed(i);
        }

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.count, 108_000);
        assert_relative_eq!(detect.max, 9.0);
        assert_eq!(logger.timings.len(), 1);
        assert_eq!(logger.metrics.len(), 1);
    }

    #[test]
    fn test_max_handles_negative_first_value() {
        let mut agg = Aggregate::default();
        agg.record(-2.0);
        agg.record(-5.0);
        assert_relative_eq!(agg.max, -2.0);
    }

    #[test]
    fn test_summary_includes_stages_and_metrics() {
        let mut logger = StatsPipelineLogger::new(10);
        logger.frame_processed(0);
        logger.timing("detect", 20.0);
        logger.metric("blinks", 2.0);
        logger.metric("blinks", 1.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Blink pipeline summary (1 processed frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("blinks: avg 1.50  total 3"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StatsPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_frame_counter() {
        let mut logger = StatsPipelineLogger::new(2);
        for i in 0..5 {
            logger.frame_processed(i * 3);
        }
        assert_eq!(logger.frames(), 5);
    }
}
