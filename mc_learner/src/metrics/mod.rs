//! Pipeline metrics and periodic training reports.
//!
//! ## Metrics
//!
//! - [`PipelineMetrics`]: Thread-safe counters for actors and assemblers
//! - [`SharedPipelineMetrics`]: Arc wrapper for multi-threaded access
//!
//! ## Report sinks
//!
//! - [`TracingSink`]: `tracing` events at info level
//! - [`CsvSink`]: CSV file for analysis
//! - [`MultiSink`]: Fan out to several sinks

pub mod pipeline_metrics;
pub mod report;

pub use pipeline_metrics::{pipeline_metrics, PipelineMetrics, SharedPipelineMetrics};
pub use report::{CsvSink, MultiSink, ReportSink, TracingSink, TrainingReport};
