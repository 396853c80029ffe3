//! Metric tracking sinks.
//!
//! Every component that reports metrics receives a sink explicitly; nothing
//! writes to a process-wide tracker. The sink is write-only from the
//! pipeline's perspective: it receives scalar metric maps with a
//! monotonically increasing step counter and is never read back.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::driver::RunResult;

/// A write-only receiver of scalar metric maps.
pub trait TrackingSink {
    /// Records one metric map at the given step.
    fn log(&mut self, metrics: &RunResult, step: u64);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TrackingSink for NullSink {
    fn log(&mut self, _metrics: &RunResult, _step: u64) {}
}

/// A sink that captures every call, for use as a test double.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    /// Every `(step, metrics)` pair logged so far, in call order.
    pub records: Vec<(u64, RunResult)>,
}

impl CaptureSink {
    /// Creates an empty capture sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The logged metric maps, ignoring steps.
    #[must_use]
    pub fn metrics(&self) -> Vec<&RunResult> {
        self.records.iter().map(|(_, m)| m).collect()
    }
}

impl TrackingSink for CaptureSink {
    fn log(&mut self, metrics: &RunResult, step: u64) {
        self.records.push((step, metrics.clone()));
    }
}

#[derive(Debug, Serialize)]
struct JsonlRecord<'a> {
    step: u64,
    recorded_at: DateTime<Utc>,
    metrics: &'a RunResult,
}

/// A sink that appends one timestamped JSON line per call to a writer.
#[derive(Debug)]
pub struct JsonlSink<W> {
    writer: W,
}

impl<W> JsonlSink<W>
where
    W: Write,
{
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> TrackingSink for JsonlSink<W>
where
    W: Write,
{
    fn log(&mut self, metrics: &RunResult, step: u64) {
        let record = JsonlRecord {
            step,
            recorded_at: Utc::now(),
            metrics,
        };
        // Tracking is best-effort recording; a failed write must not abort
        // the evaluation it is observing.
        if let Err(err) = serde_json::to_writer(&mut self.writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.writer))
        {
            log::warn!("failed to record metrics at step {step}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(value: f64) -> RunResult {
        RunResult::from([("test_a".to_owned(), value)])
    }

    #[test]
    fn test_capture_sink_records_in_call_order() {
        let mut sink = CaptureSink::new();
        sink.log(&metrics(0.5), 0);
        sink.log(&metrics(0.7), 1);

        assert_eq!(sink.records.len(), 2);
        assert_eq!(sink.records[0].0, 0);
        assert!((sink.records[1].1["test_a"] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_jsonl_sink_writes_one_line_per_call() {
        let mut sink = JsonlSink::new(Vec::new());
        sink.log(&metrics(0.5), 3);
        sink.log(&metrics(0.7), 4);

        let written = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"step\":3"));
        assert!(lines[1].contains("\"test_a\":0.7"));
    }
}
