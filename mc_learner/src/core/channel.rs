//! Bounded, shutdown-aware conduits between pipeline stages.
//!
//! Every conduit is a fixed-capacity multi-producer multi-consumer queue.
//! A full queue blocks the producer and an empty queue blocks the consumer;
//! nothing is ever silently dropped. Blocked calls wake every
//! [`POLL_INTERVAL`] to look at the [`ShutdownSignal`], and give up with
//! [`ChannelError::Shutdown`] only when the signal is raised *and* the call
//! would still block. Items already queued therefore keep flowing to
//! consumers after shutdown is requested.
//!
//! ```text
//! actors ──put──► [ transitions ] ──get──► assemblers ──put──► [ batches ] ──get──► learner
//!    └─────put──► [  outcomes   ] ──drain──────────────────────────────────────────┘
//! ```

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use thiserror::Error;

use super::shutdown::{ShutdownSignal, POLL_INTERVAL};

/// Why a channel operation gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Shutdown was requested while the operation was blocked.
    #[error("shutdown requested while waiting on channel")]
    Shutdown,
    /// Every handle on the other side has been dropped.
    #[error("channel disconnected")]
    Disconnected,
}

/// Producer side of a bounded conduit.
#[derive(Debug)]
pub struct ChannelSender<T> {
    inner: Sender<T>,
    shutdown: ShutdownSignal,
}

impl<T> Clone for ChannelSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Consumer side of a bounded conduit.
#[derive(Debug)]
pub struct ChannelReceiver<T> {
    inner: Receiver<T>,
    shutdown: ShutdownSignal,
}

impl<T> Clone for ChannelReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Create a bounded conduit holding at most `capacity` items.
///
/// # Panics
///
/// Panics if `capacity` is zero; a zero-capacity channel is a rendezvous
/// channel, which none of the pipeline stages expect.
pub fn bounded<T>(capacity: usize, shutdown: &ShutdownSignal) -> (ChannelSender<T>, ChannelReceiver<T>) {
    assert!(capacity > 0, "channel capacity must be positive");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        ChannelSender {
            inner: tx,
            shutdown: shutdown.clone(),
        },
        ChannelReceiver {
            inner: rx,
            shutdown: shutdown.clone(),
        },
    )
}

impl<T> ChannelSender<T> {
    /// Enqueue `item`, blocking while the conduit is full.
    pub fn put(&self, item: T) -> Result<(), ChannelError> {
        let mut item = match self.inner.try_send(item) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Disconnected(_)) => return Err(ChannelError::Disconnected),
            Err(TrySendError::Full(item)) => item,
        };

        loop {
            if self.shutdown.is_requested() {
                return Err(ChannelError::Shutdown);
            }
            match self.inner.send_timeout(item, POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => item = back,
                Err(SendTimeoutError::Disconnected(_)) => return Err(ChannelError::Disconnected),
            }
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity().unwrap_or(usize::MAX)
    }
}

impl<T> ChannelReceiver<T> {
    /// Dequeue one item, blocking while the conduit is empty.
    pub fn get(&self) -> Result<T, ChannelError> {
        if let Ok(item) = self.inner.try_recv() {
            return Ok(item);
        }

        loop {
            if self.shutdown.is_requested() {
                // Drain whatever raced in before giving up.
                return self.inner.try_recv().map_err(|_| ChannelError::Shutdown);
            }
            match self.inner.recv_timeout(POLL_INTERVAL) {
                Ok(item) => return Ok(item),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(ChannelError::Disconnected),
            }
        }
    }

    /// Take every item queued at the time of the call without blocking.
    ///
    /// Items that arrive while draining are left for the next call, so a
    /// busy producer cannot keep this loop alive.
    pub fn drain(&self) -> Vec<T> {
        let pending = self.inner.len();
        let mut items = Vec::with_capacity(pending);
        for _ in 0..pending {
            match self.inner.try_recv() {
                Ok(item) => items.push(item),
                Err(_) => break,
            }
        }
        items
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity().unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_put_get_fifo() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(4, &shutdown);

        tx.put(1).unwrap();
        tx.put(2).unwrap();
        tx.put(3).unwrap();

        assert_eq!(rx.len(), 3);
        assert_eq!(rx.get().unwrap(), 1);
        assert_eq!(rx.get().unwrap(), 2);
        assert_eq!(rx.get().unwrap(), 3);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded::<u32>(2, &shutdown);

        let producer = {
            let tx = tx.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    tx.put(i).unwrap();
                }
            })
        };

        let mut received = Vec::new();
        while received.len() < 10 {
            assert!(tx.len() <= 2);
            received.push(rx.get().unwrap());
            thread::sleep(Duration::from_millis(2));
        }
        producer.join().unwrap();

        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_put_blocks_until_space() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(1, &shutdown);
        tx.put(0u8).unwrap();
        assert!(tx.is_full());

        let start = Instant::now();
        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            rx.get().unwrap()
        });

        tx.put(1).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(90));
        assert_eq!(consumer.join().unwrap(), 0);
    }

    #[test]
    fn test_shutdown_unblocks_full_put() {
        let shutdown = ShutdownSignal::new();
        let (tx, _rx) = bounded(1, &shutdown);
        tx.put(0u8).unwrap();

        let trigger = shutdown.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            trigger.request();
        });

        assert_eq!(tx.put(1), Err(ChannelError::Shutdown));
        waker.join().unwrap();
    }

    #[test]
    fn test_shutdown_drains_before_failing_get() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(4, &shutdown);
        tx.put(7).unwrap();
        shutdown.request();

        assert_eq!(rx.get(), Ok(7));
        assert_eq!(rx.get(), Err(ChannelError::Shutdown));
    }

    #[test]
    fn test_put_succeeds_with_room_after_shutdown() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(2, &shutdown);
        shutdown.request();

        assert!(tx.put(1).is_ok());
        assert_eq!(rx.drain(), vec![1]);
    }

    #[test]
    fn test_disconnected_receiver() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded::<u8>(1, &shutdown);
        drop(rx);
        assert_eq!(tx.put(1), Err(ChannelError::Disconnected));
    }

    #[test]
    fn test_drain_is_non_blocking() {
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = bounded(8, &shutdown);
        assert!(rx.drain().is_empty());

        for i in 0..5 {
            tx.put(i).unwrap();
        }
        assert_eq!(rx.drain(), vec![0, 1, 2, 3, 4]);
        assert!(rx.is_empty());
        assert_eq!(rx.capacity(), 8);
    }
}
