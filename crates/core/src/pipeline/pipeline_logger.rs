use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for batch orchestration events.
///
/// Executors report through this trait from the coordinating thread only,
/// so implementations need no internal locking.
pub trait PipelineLogger: Send {
    /// Report image-level progress. `total` is `None` while the input is
    /// still being enumerated.
    fn progress(&mut self, current: usize, total: Option<usize>);

    /// Record how long a named stage took for one image.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. queue depth, detection count).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Report a per-image failure. The batch continues.
    fn warn(&mut self, message: &str);

    /// Emit an end-of-batch summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: Option<usize>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// CLI-oriented logger that forwards to the `log` facade, tracks per-stage
/// timing and metrics, and prints a summary when the batch completes.
///
/// Progress output is throttled to every `throttle_images` images.
pub struct StdoutPipelineLogger {
    throttle_images: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    images: usize,
    warnings: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_images: usize) -> Self {
        Self {
            throttle_images: throttle_images.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            images: 0,
            warnings: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was processed.
    pub fn summary_string(&self) -> Option<String> {
        if self.images == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let images = self.images;
        let mut lines = Vec::new();

        lines.push(format!(
            "Batch summary ({images} images, {} failed, {:.1}s total):",
            self.warnings,
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let sum: f64 = values.iter().sum();
            lines.push(format!("  {name}: avg {:.1}  total {sum:.0}", mean(values)));
        }

        if images > 0 && elapsed_ms > 0.0 {
            let rate = images as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.1} images/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: Option<usize>) {
        self.images = self.images.max(current);
        let at_mark = current % self.throttle_images == 0;
        match total {
            Some(total) if total > 0 && (at_mark || current == total) => {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Progress: {current}/{total} images ({pct:.1}%)");
            }
            None if at_mark => log::info!("Progress: {current} images"),
            _ => {}
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.warnings += 1;
        log::warn!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, Some(10));
        logger.progress(2, None);
        logger.timing("detect", 5.0);
        logger.metric("queue_depth", 3.0);
        logger.info("hello");
        logger.warn("oops");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("encode", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.len(), 2);
        assert_relative_eq!(detect[1], 30.0);
        assert_eq!(logger.timings_for("encode").unwrap().len(), 1);
        assert!(logger.timings_for("write").is_none());
    }

    #[test]
    fn test_metric_average_in_summary() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(2, Some(2));
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);

        assert_relative_eq!(mean(logger.metrics_for("faces").unwrap()), 3.5);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("faces: avg 3.5  total 7"));
    }

    #[test]
    fn test_summary_counts_images_and_failures() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(1, None);
        logger.progress(2, None);
        logger.warn("Failed batch1,x.jpg");
        logger.timing("decode", 1.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Batch summary (2 images, 1 failed"));
        assert!(summary.contains("decode"));
        assert!(summary.contains("images/s"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_highest_count() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(i, Some(20));
        }
        assert_eq!(logger.images, 20);
    }

    #[test]
    fn test_default_throttle() {
        assert_eq!(StdoutPipelineLogger::default().throttle_images, 10);
        assert_eq!(StdoutPipelineLogger::new(0).throttle_images, 1);
    }
}
