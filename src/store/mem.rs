//! In-process counter store.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::counter::CounterStore;
use super::slots::Slots;
use crate::error::{Result, StoreError};

/// An in-memory [`CounterStore`].
///
/// Insertions are serialized by a structural lock, while reads and
/// compare-and-swap on existing keys go straight to the entry's atomic, so
/// counter updates on unrelated keys never contend.
///
/// With a key limit the store keeps at most that many keys and evicts the least
/// recently used one to make room. A request for an evicted key is processed as
/// if the key had never been set, which can let through requests an unbounded
/// store would have denied. Without a limit memory use grows with the number of
/// distinct keys.
///
/// State is local to this process. Instances that must share rate limit state
/// need a [`TimedStore`](super::TimedStore) backend instead.
pub struct MemStore {
    slots: Slots<AtomicI64>,
}

impl MemStore {
    /// Create a store from a key limit.
    ///
    /// `max_keys > 0` bounds the store to that many keys with LRU eviction;
    /// `max_keys <= 0` leaves it unbounded.
    pub fn new(max_keys: i64) -> Result<Self> {
        Ok(Self {
            slots: Slots::new(max_keys)?,
        })
    }

    /// Create a store with no limit on the number of keys.
    pub fn unbounded() -> Self {
        Self {
            slots: Slots::unbounded(),
        }
    }

    /// Create a store holding at most `capacity` keys.
    ///
    /// Fails if `capacity` is zero.
    pub fn bounded(capacity: usize) -> Result<Self> {
        Ok(Self {
            slots: Slots::bounded(capacity)?,
        })
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key limit, or `None` for an unbounded store.
    pub fn capacity(&self) -> Option<usize> {
        self.slots.capacity()
    }

    fn slot(&self, key: &str) -> Result<Arc<AtomicI64>> {
        self.slots.get(key).ok_or(StoreError::NotFound)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl CounterStore for MemStore {
    fn get(&self, key: &str) -> Result<i64> {
        let slot = self.slot(key)?;
        Ok(slot.load(Ordering::SeqCst))
    }

    fn set_if_absent(&self, key: &str, value: i64) -> Result<bool> {
        let (_, created) = self
            .slots
            .get_or_insert_with(key, || AtomicI64::new(value));
        Ok(created)
    }

    fn compare_and_swap(&self, key: &str, old: i64, new: i64) -> Result<bool> {
        let slot = self.slot(key)?;
        Ok(slot
            .compare_exchange(old, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok())
    }
}
