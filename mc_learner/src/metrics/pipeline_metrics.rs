//! Shared counters updated by actors and assemblers, read by the learner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe pipeline counters.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Completed episodes across all actors
    episodes: AtomicU64,
    /// Environment steps across all completed episodes
    frames: AtomicU64,
    /// Episodes abandoned after an error or panic
    episode_faults: AtomicU64,
    /// Transitions moved into replay buffers
    transitions_buffered: AtomicU64,
    /// Transitions an assembler refused for a mismatched observation size
    transitions_rejected: AtomicU64,
    /// Batches handed to the learner
    batches_assembled: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_episode(&self, frames: usize) {
        self.episodes.fetch_add(1, Ordering::Relaxed);
        self.frames.fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn record_fault(&self) {
        self.episode_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_transitions_buffered(&self, n: usize) {
        self.transitions_buffered.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn record_rejected_transition(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches_assembled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::Relaxed)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn episode_faults(&self) -> u64 {
        self.episode_faults.load(Ordering::Relaxed)
    }

    pub fn transitions_buffered(&self) -> u64 {
        self.transitions_buffered.load(Ordering::Relaxed)
    }

    pub fn transitions_rejected(&self) -> u64 {
        self.transitions_rejected.load(Ordering::Relaxed)
    }

    pub fn batches_assembled(&self) -> u64 {
        self.batches_assembled.load(Ordering::Relaxed)
    }
}

/// Thread-safe shared pipeline metrics.
pub type SharedPipelineMetrics = Arc<PipelineMetrics>;

/// Create new shared pipeline metrics.
pub fn pipeline_metrics() -> SharedPipelineMetrics {
    Arc::new(PipelineMetrics::new())
}
