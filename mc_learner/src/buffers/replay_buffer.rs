//! Fixed-capacity ring replay buffer owned by a single assembler.
//!
//! Storage is reserved up front so an impossible capacity fails at startup
//! instead of mid-training. Once full, each push overwrites the oldest
//! entry.

use rand::seq::index;
use rand::Rng;
use thiserror::Error;

/// The requested capacity could not be reserved.
#[derive(Debug, Error)]
#[error("cannot reserve replay storage for {capacity} transitions")]
pub struct ReplayAllocError {
    pub capacity: usize,
}

/// Ring buffer with uniform sampling without replacement.
#[derive(Debug)]
pub struct ReplayBuffer<T> {
    data: Vec<T>,
    /// Index of the oldest entry once the buffer is full.
    head: usize,
    capacity: usize,
}

impl<T> ReplayBuffer<T> {
    /// Reserve storage for exactly `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, ReplayAllocError> {
        if capacity == 0 {
            return Err(ReplayAllocError { capacity });
        }
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ReplayAllocError { capacity })?;
        Ok(Self {
            data,
            head: 0,
            capacity,
        })
    }

    /// Insert `item`, evicting the oldest entry when full.
    pub fn push(&mut self, item: T) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.head] = item;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry `idx` in insertion order, 0 being the oldest retained.
    pub fn get(&self, idx: usize) -> Option<&T> {
        if idx >= self.data.len() {
            return None;
        }
        let actual = if self.is_full() {
            (self.head + idx) % self.capacity
        } else {
            idx
        };
        self.data.get(actual)
    }

    /// Retained entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newer, older) = self.data.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// `n` distinct entries chosen uniformly at random, or `None` when fewer
    /// than `n` are stored.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Option<Vec<&T>> {
        if n > self.data.len() {
            return None;
        }
        Some(
            index::sample(rng, self.data.len(), n)
                .into_iter()
                .map(|i| &self.data[i])
                .collect(),
        )
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
    }
}
