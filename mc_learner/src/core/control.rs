//! Single-writer scalar cells the learner publishes and actors read.
//!
//! Each constructor returns a writer and a reader. Writers are not `Clone`,
//! so exactly one component can change the value; readers are cheap to
//! clone and hand to every actor. Reads never block and may observe a value
//! one update behind, which actors tolerate.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Exploration rate
// ============================================================================

/// Writer half of the shared exploration rate.
#[derive(Debug)]
pub struct ExplorationWriter {
    bits: Arc<AtomicU64>,
}

/// Reader half of the shared exploration rate.
#[derive(Debug, Clone)]
pub struct ExplorationReader {
    bits: Arc<AtomicU64>,
}

/// Create an exploration-rate cell holding `initial`.
pub fn exploration_rate(initial: f64) -> (ExplorationWriter, ExplorationReader) {
    let bits = Arc::new(AtomicU64::new(initial.to_bits()));
    (
        ExplorationWriter { bits: Arc::clone(&bits) },
        ExplorationReader { bits },
    )
}

impl ExplorationWriter {
    pub fn publish(&self, epsilon: f64) {
        self.bits.store(epsilon.to_bits(), Ordering::Release);
    }

    pub fn current(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Another reader for the same cell.
    pub fn reader(&self) -> ExplorationReader {
        ExplorationReader {
            bits: Arc::clone(&self.bits),
        }
    }
}

impl ExplorationReader {
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

// ============================================================================
// Difficulty index
// ============================================================================

/// Writer half of the curriculum difficulty index.
///
/// The only mutation is [`advance`](Self::advance), so the index is
/// monotonically non-decreasing and never leaves `0..n_levels`.
#[derive(Debug)]
pub struct DifficultyWriter {
    index: Arc<AtomicUsize>,
    n_levels: usize,
}

/// Reader half of the curriculum difficulty index.
#[derive(Debug, Clone)]
pub struct DifficultyReader {
    index: Arc<AtomicUsize>,
    n_levels: usize,
}

/// Create a difficulty cell over `n_levels` ordered levels, starting at 0.
///
/// # Panics
///
/// Panics if `n_levels` is zero.
pub fn difficulty_index(n_levels: usize) -> (DifficultyWriter, DifficultyReader) {
    assert!(n_levels > 0, "difficulty ladder must have at least one level");
    let index = Arc::new(AtomicUsize::new(0));
    (
        DifficultyWriter {
            index: Arc::clone(&index),
            n_levels,
        },
        DifficultyReader { index, n_levels },
    )
}

impl DifficultyWriter {
    /// Move to the next level. Returns the new index, or `None` when
    /// already at the hardest level.
    pub fn advance(&self) -> Option<usize> {
        let current = self.index.load(Ordering::Acquire);
        if current + 1 >= self.n_levels {
            return None;
        }
        self.index.store(current + 1, Ordering::Release);
        Some(current + 1)
    }

    pub fn current(&self) -> usize {
        self.index.load(Ordering::Acquire)
    }

    pub fn n_levels(&self) -> usize {
        self.n_levels
    }

    pub fn is_at_max(&self) -> bool {
        self.current() + 1 >= self.n_levels
    }

    pub fn reader(&self) -> DifficultyReader {
        DifficultyReader {
            index: Arc::clone(&self.index),
            n_levels: self.n_levels,
        }
    }
}

impl DifficultyReader {
    pub fn get(&self) -> usize {
        self.index.load(Ordering::Acquire)
    }

    pub fn n_levels(&self) -> usize {
        self.n_levels
    }
}
