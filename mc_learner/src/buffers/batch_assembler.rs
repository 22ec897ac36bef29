//! Batch assembler: drains transitions into a private replay ring and
//! samples training batches from it.
//!
//! Each assembler thread loops:
//!
//! 1. Pull transitions from the shared transition channel according to
//!    its [`DrainPolicy`], rejecting any whose observation size disagrees
//!    with the ring's
//! 2. Skip sampling until its ring holds the warm-up count
//! 3. Sample `batch_size` distinct transitions and enqueue the batch
//!
//! Backpressure from the batch channel throttles sampling; the drain
//! policy sets how many fresh frames enter the ring per batch produced.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::batch::Batch;
use super::replay_buffer::{ReplayAllocError, ReplayBuffer};
use crate::core::channel::{ChannelError, ChannelReceiver, ChannelSender};
use crate::core::shutdown::ShutdownSignal;
use crate::core::transition::Transition;
use crate::metrics::SharedPipelineMetrics;

/// How many transitions an assembler pulls per loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Pull one transition on every `k`-th iteration only.
    EveryNthIteration(u64),
    /// Pull `k` transitions on every iteration.
    PerIteration(usize),
}

impl DrainPolicy {
    /// Derive from a frame-to-step ratio.
    ///
    /// Ratios below one pull a single frame every `trunc(1 / ratio)`
    /// iterations; ratios of one or more pull `trunc(ratio)` frames each
    /// iteration.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 1.0 {
            let every = if ratio > 0.0 { (1.0 / ratio) as u64 } else { u64::MAX };
            DrainPolicy::EveryNthIteration(every.max(1))
        } else {
            DrainPolicy::PerIteration((ratio as usize).max(1))
        }
    }

    /// Transitions to pull on (1-based) iteration `iteration`.
    pub fn frames_for(&self, iteration: u64) -> usize {
        match *self {
            DrainPolicy::EveryNthIteration(k) => usize::from(iteration % k == 0),
            DrainPolicy::PerIteration(k) => k,
        }
    }
}

/// Assembler configuration.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub assembler_id: usize,
    /// Ring capacity for this assembler.
    pub capacity: usize,
    /// Transitions required before the first batch.
    pub warmup: usize,
    pub batch_size: usize,
    pub drain: DrainPolicy,
    pub seed: u64,
    /// Observation size every buffered transition must have. When unset,
    /// the first accepted transition fixes it.
    pub obs_size: Option<usize>,
}

impl AssemblerConfig {
    pub fn new(assembler_id: usize, capacity: usize, warmup: usize, batch_size: usize) -> Self {
        Self {
            assembler_id,
            capacity,
            warmup,
            batch_size,
            drain: DrainPolicy::PerIteration(1),
            seed: assembler_id as u64,
            obs_size: None,
        }
    }

    pub fn with_drain(mut self, drain: DrainPolicy) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_obs_size(mut self, obs_size: usize) -> Self {
        self.obs_size = Some(obs_size);
        self
    }
}

/// Totals returned when an assembler exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub assembler_id: usize,
    /// Transitions pulled off the channel, rejected ones included.
    pub transitions_received: u64,
    /// Transitions dropped for a mismatched observation size.
    pub transitions_rejected: u64,
    pub batches_emitted: u64,
    pub iterations: u64,
}

/// Channel ends and shared state an assembler works with.
#[derive(Clone)]
pub struct AssemblerLinks {
    pub transitions: ChannelReceiver<Transition>,
    pub batches: ChannelSender<Batch>,
    pub metrics: SharedPipelineMetrics,
    pub shutdown: ShutdownSignal,
}

/// One batch-assembler worker.
pub struct BatchAssembler {
    config: AssemblerConfig,
    links: AssemblerLinks,
    buffer: ReplayBuffer<Transition>,
    obs_size: Option<usize>,
    rng: SmallRng,
    stats: AssemblerStats,
}

impl BatchAssembler {
    /// Reserve the ring up front; fails if the capacity cannot be allocated.
    pub fn new(config: AssemblerConfig, links: AssemblerLinks) -> Result<Self, ReplayAllocError> {
        let buffer = ReplayBuffer::new(config.capacity)?;
        let rng = SmallRng::seed_from_u64(config.seed);
        let stats = AssemblerStats {
            assembler_id: config.assembler_id,
            ..Default::default()
        };
        Ok(Self {
            obs_size: config.obs_size,
            config,
            links,
            buffer,
            rng,
            stats,
        })
    }

    pub fn buffer(&self) -> &ReplayBuffer<Transition> {
        &self.buffer
    }

    pub fn stats(&self) -> &AssemblerStats {
        &self.stats
    }

    pub fn is_warm(&self) -> bool {
        self.buffer.len() >= self.config.warmup
    }

    /// Loop until shutdown or a disconnected channel.
    pub fn run(mut self) -> AssemblerStats {
        let id = self.config.assembler_id;
        info!(
            assembler = id,
            capacity = self.config.capacity,
            warmup = self.config.warmup,
            "assembler started"
        );

        while !self.links.shutdown.is_requested() {
            if let Err(reason) = self.iterate() {
                debug!(assembler = id, %reason, "assembler leaving loop");
                break;
            }
        }

        info!(
            assembler = id,
            received = self.stats.transitions_received,
            rejected = self.stats.transitions_rejected,
            batches = self.stats.batches_emitted,
            "assembler stopped"
        );
        self.stats
    }

    /// One loop iteration: drain, then maybe emit a batch.
    ///
    /// Returns whether a batch was emitted.
    pub fn iterate(&mut self) -> Result<bool, ChannelError> {
        self.stats.iterations += 1;
        let frames = self.config.drain.frames_for(self.stats.iterations);
        for _ in 0..frames {
            let transition = self.links.transitions.get()?;
            self.stats.transitions_received += 1;
            self.accept(transition);
        }

        if !self.is_warm() {
            return Ok(false);
        }

        let Some(sample) = self.buffer.sample(&mut self.rng, self.config.batch_size) else {
            return Ok(false);
        };
        let batch = match Batch::from_transitions(sample) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(assembler = self.config.assembler_id, error = %err, "dropping malformed sample");
                return Ok(false);
            }
        };

        self.links.batches.put(batch)?;
        self.stats.batches_emitted += 1;
        self.links.metrics.record_batch();
        Ok(true)
    }

    /// Buffer `transition` unless its observation size disagrees with the
    /// ring's.
    fn accept(&mut self, transition: Transition) -> bool {
        let expected = *self.obs_size.get_or_insert(transition.obs_size());
        if transition.obs_size() != expected {
            self.stats.transitions_rejected += 1;
            self.links.metrics.record_rejected_transition();
            if self.stats.transitions_rejected.is_power_of_two() {
                warn!(
                    assembler = self.config.assembler_id,
                    expected,
                    actual = transition.obs_size(),
                    rejected_total = self.stats.transitions_rejected,
                    "rejected transition with mismatched observation size"
                );
            }
            return false;
        }
        self.buffer.push(transition);
        self.links.metrics.add_transitions_buffered(1);
        true
    }

    /// Run the assembler on a named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<AssemblerStats>> {
        thread::Builder::new()
            .name(format!("assembler-{}", self.config.assembler_id))
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::bounded;
    use crate::metrics::pipeline_metrics;
    use std::time::Duration;

    fn links(shutdown: &ShutdownSignal) -> (AssemblerLinks, ChannelSender<Transition>, ChannelReceiver<Batch>) {
        let (tx, transitions) = bounded(256, shutdown);
        let (batches, rx) = bounded(4, shutdown);
        (
            AssemblerLinks {
                transitions,
                batches,
                metrics: pipeline_metrics(),
                shutdown: shutdown.clone(),
            },
            tx,
            rx,
        )
    }

    fn transition(i: u32) -> Transition {
        Transition::new(vec![i as f32, 0.5], i % 3, i as f32 * 0.1)
    }

    #[test]
    fn test_drain_policy_from_ratio() {
        assert_eq!(DrainPolicy::from_ratio(1.0), DrainPolicy::PerIteration(1));
        assert_eq!(DrainPolicy::from_ratio(4.7), DrainPolicy::PerIteration(4));
        assert_eq!(DrainPolicy::from_ratio(0.25), DrainPolicy::EveryNthIteration(4));
        assert_eq!(DrainPolicy::from_ratio(0.3), DrainPolicy::EveryNthIteration(3));
    }

    #[test]
    fn test_drain_policy_frames() {
        let every_third = DrainPolicy::EveryNthIteration(3);
        let frames: Vec<usize> = (1..=6).map(|i| every_third.frames_for(i)).collect();
        assert_eq!(frames, vec![0, 0, 1, 0, 0, 1]);
        assert_eq!(DrainPolicy::PerIteration(2).frames_for(7), 2);
    }

    #[test]
    fn test_no_batches_before_warmup() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, rx) = links(&shutdown);
        let config = AssemblerConfig::new(0, 50, 10, 4);
        let mut assembler = BatchAssembler::new(config, links).unwrap();

        for i in 0..9 {
            tx.put(transition(i)).unwrap();
            assert!(!assembler.iterate().unwrap());
        }
        assert!(rx.is_empty());

        tx.put(transition(9)).unwrap();
        assert!(assembler.iterate().unwrap());
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_batches_are_subsets_of_received() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, rx) = links(&shutdown);
        let config = AssemblerConfig::new(0, 32, 8, 8).with_drain(DrainPolicy::PerIteration(2));
        let mut assembler = BatchAssembler::new(config, links).unwrap();

        let sent: Vec<Transition> = (0..40).map(transition).collect();
        let mut emitted = Vec::new();
        for pair in sent.chunks(2) {
            for t in pair {
                tx.put(t.clone()).unwrap();
            }
            if assembler.iterate().unwrap() {
                emitted.push(rx.get().unwrap());
            }
        }

        assert!(!emitted.is_empty());
        for batch in &emitted {
            assert_eq!(batch.len(), 8);
            for i in 0..batch.len() {
                let row = batch.transition(i).unwrap();
                assert!(sent.contains(&row), "{row:?} was never sent");
            }
        }
        assert_eq!(assembler.stats().transitions_received, 40);
        assert_eq!(assembler.buffer().len(), 32);
    }

    #[test]
    fn test_sparse_drain_reuses_buffer() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, rx) = links(&shutdown);
        let config = AssemblerConfig::new(0, 16, 4, 4).with_drain(DrainPolicy::EveryNthIteration(2));
        let mut assembler = BatchAssembler::new(config, links).unwrap();

        for i in 0..4 {
            tx.put(transition(i)).unwrap();
        }
        let mut batches = 0;
        for _ in 0..9 {
            if assembler.iterate().unwrap() {
                batches += 1;
                rx.get().unwrap();
            }
        }

        assert_eq!(assembler.stats().transitions_received, 4);
        assert_eq!(batches, 2);
    }

    #[test]
    fn test_mismatched_transition_is_rejected_and_batches_keep_flowing() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, rx) = links(&shutdown);
        let metrics = links.metrics.clone();
        let config = AssemblerConfig::new(0, 8, 4, 4);
        let mut assembler = BatchAssembler::new(config, links).unwrap();

        for i in 0..2 {
            tx.put(transition(i)).unwrap();
        }
        tx.put(Transition::new(vec![1.0, 2.0, 3.0], 0, 0.0)).unwrap();
        for i in 2..12 {
            tx.put(transition(i)).unwrap();
        }

        let mut batches = 0;
        for _ in 0..13 {
            if assembler.iterate().unwrap() {
                let batch = rx.get().unwrap();
                assert_eq!(batch.obs_size(), 2);
                batches += 1;
            }
        }

        assert_eq!(assembler.stats().transitions_received, 13);
        assert_eq!(assembler.stats().transitions_rejected, 1);
        assert_eq!(metrics.transitions_rejected(), 1);
        assert_eq!(metrics.transitions_buffered(), 12);
        assert!(assembler.buffer().iter().all(|t| t.obs_size() == 2));
        assert_eq!(batches, 9);
    }

    #[test]
    fn test_configured_obs_size_applies_to_first_transition() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, _rx) = links(&shutdown);
        let config = AssemblerConfig::new(0, 8, 4, 4).with_obs_size(3);
        let mut assembler = BatchAssembler::new(config, links).unwrap();

        tx.put(transition(0)).unwrap();
        tx.put(Transition::new(vec![0.0; 3], 1, 1.0)).unwrap();
        assembler.iterate().unwrap();
        assembler.iterate().unwrap();

        assert_eq!(assembler.stats().transitions_rejected, 1);
        assert_eq!(assembler.buffer().len(), 1);
    }

    #[test]
    fn test_partial_drain_counts_what_was_taken() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, _rx) = links(&shutdown);
        let config = AssemblerConfig::new(0, 16, 8, 4).with_drain(DrainPolicy::PerIteration(5));
        let mut assembler = BatchAssembler::new(config, links).unwrap();

        for i in 0..3 {
            tx.put(transition(i)).unwrap();
        }
        shutdown.request();

        assert!(matches!(assembler.iterate(), Err(ChannelError::Shutdown)));
        assert_eq!(assembler.stats().transitions_received, 3);
        assert_eq!(assembler.buffer().len(), 3);
    }

    #[test]
    fn test_shutdown_stops_running_assembler() {
        let shutdown = ShutdownSignal::new();
        let (links, tx, _rx) = links(&shutdown);
        let metrics = links.metrics.clone();
        let config = AssemblerConfig::new(3, 16, 4, 2);
        let assembler = BatchAssembler::new(config, links).unwrap();
        let handle = assembler.spawn().unwrap();

        for i in 0..20 {
            tx.put(transition(i)).unwrap();
        }
        std::thread::sleep(Duration::from_millis(100));
        shutdown.request();

        let stats = handle.join().unwrap();
        assert_eq!(stats.assembler_id, 3);
        assert!(stats.transitions_received > 0);
        assert_eq!(metrics.batches_assembled(), stats.batches_emitted);
        assert!(stats.batches_emitted >= 4);
    }
}
