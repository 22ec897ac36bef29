//! Cooperative shutdown flag shared by every pipeline thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often blocked operations re-check the shutdown flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cloneable shutdown request.
///
/// Raising the signal never interrupts work in progress. Threads observe it
/// at their own checkpoints (episode steps, channel waits, loop iterations)
/// and unwind on their own.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this signal to stop.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_is_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_requested());

        signal.request();
        assert!(observer.is_requested());
    }
}
