//! Versioned slot carrying the target model's serialized weights.
//!
//! The learner is the only writer. Actors poll [`TargetReader::version`]
//! (a single atomic load) and fetch the snapshot only when it changed.
//! Snapshots are immutable and reference counted, so a reader that holds
//! one keeps a complete, consistent set of weights even while the learner
//! publishes the next.
//!
//! ```text
//! Learner                                   Actor
//! ┌──────────────────┐                      ┌──────────────────┐
//! │ into_record()    │                      │ load_record()    │
//! │       ↓          │                      │       ↑          │
//! │ recorder.record()│                      │ recorder.load()  │
//! │       ↓          │                      │       ↑          │
//! │ Arc<Snapshot> ───────── TargetSlot ───────→ Arc<Snapshot>  │
//! └──────────────────┘                      └──────────────────┘
//! ```

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Immutable target-model snapshot.
#[derive(Debug)]
pub struct ModelSnapshot {
    version: u64,
    step: u64,
    bytes: Vec<u8>,
}

impl ModelSnapshot {
    /// Monotonic publish counter, starting at 1.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Learner step at which the snapshot was taken.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Default)]
struct TargetSlot {
    current: Mutex<Option<Arc<ModelSnapshot>>>,
    version: AtomicU64,
}

/// Writer half, owned by the learner.
#[derive(Debug)]
pub struct TargetPublisher {
    slot: Arc<TargetSlot>,
}

/// Reader half, cloned into every actor.
#[derive(Debug, Clone)]
pub struct TargetReader {
    slot: Arc<TargetSlot>,
}

/// Create an empty target slot.
pub fn target_slot() -> (TargetPublisher, TargetReader) {
    let slot = Arc::new(TargetSlot::default());
    (
        TargetPublisher { slot: Arc::clone(&slot) },
        TargetReader { slot },
    )
}

impl TargetPublisher {
    /// Replace the current snapshot. Returns the new version.
    pub fn publish(&self, bytes: Vec<u8>, step: u64) -> u64 {
        let mut guard = self.slot.current.lock();
        let version = self.slot.version.load(Ordering::Acquire) + 1;
        *guard = Some(Arc::new(ModelSnapshot { version, step, bytes }));
        self.slot.version.store(version, Ordering::Release);
        version
    }

    pub fn version(&self) -> u64 {
        self.slot.version.load(Ordering::Acquire)
    }

    pub fn reader(&self) -> TargetReader {
        TargetReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl TargetReader {
    /// Version of the newest snapshot, 0 when nothing was published yet.
    pub fn version(&self) -> u64 {
        self.slot.version.load(Ordering::Acquire)
    }

    pub fn latest(&self) -> Option<Arc<ModelSnapshot>> {
        self.slot.current.lock().clone()
    }

    /// The newest snapshot if it is newer than `seen`.
    pub fn newer_than(&self, seen: u64) -> Option<Arc<ModelSnapshot>> {
        if self.version() <= seen {
            return None;
        }
        self.latest().filter(|snapshot| snapshot.version > seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_slot() {
        let (_publisher, reader) = target_slot();
        assert_eq!(reader.version(), 0);
        assert!(reader.latest().is_none());
        assert!(reader.newer_than(0).is_none());
    }

    #[test]
    fn test_publish_bumps_version() {
        let (publisher, reader) = target_slot();

        assert_eq!(publisher.publish(vec![1, 2, 3], 0), 1);
        assert_eq!(publisher.publish(vec![4], 100), 2);

        let snapshot = reader.latest().unwrap();
        assert_eq!(snapshot.version(), 2);
        assert_eq!(snapshot.step(), 100);
        assert_eq!(snapshot.bytes(), &[4]);
    }

    #[test]
    fn test_held_snapshot_survives_republish() {
        let (publisher, reader) = target_slot();
        publisher.publish(vec![1; 8], 0);
        let held = reader.latest().unwrap();

        publisher.publish(vec![2; 8], 10);

        assert_eq!(held.bytes(), &[1; 8]);
        assert_eq!(reader.latest().unwrap().bytes(), &[2; 8]);
    }

    #[test]
    fn test_newer_than_filters_seen_versions() {
        let (publisher, reader) = target_slot();
        publisher.publish(vec![0], 0);

        let first = reader.newer_than(0).unwrap();
        assert!(reader.newer_than(first.version()).is_none());

        publisher.publish(vec![1], 5);
        assert_eq!(reader.newer_than(first.version()).unwrap().step(), 5);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let (publisher, reader) = target_slot();
        publisher.publish(vec![0; 64], 0);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reader = reader.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = reader.latest().unwrap();
                        let first = snapshot.bytes()[0];
                        assert!(snapshot.bytes().iter().all(|&b| b == first));
                    }
                })
            })
            .collect();

        for i in 1..50u8 {
            publisher.publish(vec![i; 64], u64::from(i));
        }

        for handle in readers {
            handle.join().unwrap();
        }
        assert_eq!(reader.version(), 50);
    }
}
