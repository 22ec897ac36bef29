//! Periodic learner reports and the sinks that consume them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Learner progress, emitted every `report_interval` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Learner steps completed.
    pub step: u64,
    /// Seconds since the learner started.
    pub elapsed_secs: f64,
    /// Learner steps per second over the report interval.
    pub steps_per_sec: f64,
    /// Exploration rate published at the last step.
    pub epsilon: f64,
    /// Mean loss over the report interval.
    pub mean_loss: f64,
    /// Current curriculum difficulty name.
    pub difficulty: String,
    /// Win rate of the most recent full outcome window, if any.
    pub win_rate: Option<f64>,
    /// Episodes completed across all actors.
    pub episodes: u64,
    /// Episodes abandoned after faults.
    pub episode_faults: u64,
}

/// Destination for training reports.
pub trait ReportSink: Send {
    fn report(&mut self, report: &TrainingReport);

    /// Flush any buffered output.
    fn flush(&mut self) {}
}

/// Emits each report as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&mut self, r: &TrainingReport) {
        info!(
            step = r.step,
            elapsed_secs = format_args!("{:.1}", r.elapsed_secs),
            steps_per_sec = format_args!("{:.1}", r.steps_per_sec),
            epsilon = format_args!("{:.4}", r.epsilon),
            mean_loss = format_args!("{:.6}", r.mean_loss),
            difficulty = %r.difficulty,
            win_rate = ?r.win_rate,
            episodes = r.episodes,
            faults = r.episode_faults,
            "training progress"
        );
    }
}

/// CSV file sink for analysis.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    pub const HEADER: &'static str =
        "step,elapsed_secs,steps_per_sec,epsilon,mean_loss,difficulty,win_rate,episodes,episode_faults";

    /// Create the file and write the header.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", Self::HEADER)?;
        Ok(Self { writer })
    }
}

impl ReportSink for CsvSink {
    fn report(&mut self, r: &TrainingReport) {
        let win_rate = r.win_rate.map(|w| format!("{w:.4}")).unwrap_or_default();
        let _ = writeln!(
            self.writer,
            "{},{:.2},{:.2},{:.6},{:.6},{},{},{},{}",
            r.step, r.elapsed_secs, r.steps_per_sec, r.epsilon, r.mean_loss, r.difficulty, win_rate, r.episodes, r.episode_faults
        );
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Fans each report out to several sinks.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: ReportSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ReportSink for MultiSink {
    fn report(&mut self, report: &TrainingReport) {
        for sink in &mut self.sinks {
            sink.report(report);
        }
    }

    fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }
}
