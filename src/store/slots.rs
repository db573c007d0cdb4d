//! Structural container shared by the in-memory stores.
//!
//! `Slots` owns the key -> entry mapping. It hands out `Arc` clones of the
//! entries so that value updates happen on the entry itself, after the
//! structural guard has been released.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::error::{Result, StoreError};

pub(crate) enum Slots<T> {
    /// No limit on the number of keys.
    Unbounded(RwLock<HashMap<String, Arc<T>>>),
    /// Fixed capacity, least recently used key evicted on overflow.
    ///
    /// A lookup reorders the recency list, so even reads need exclusive access.
    Bounded(Mutex<LruCache<String, Arc<T>>>),
}

impl<T> Slots<T> {
    /// Select the mode from a key limit: `> 0` is bounded, anything else unbounded.
    pub(crate) fn new(max_keys: i64) -> Result<Self> {
        if max_keys <= 0 {
            return Ok(Self::unbounded());
        }

        let capacity = usize::try_from(max_keys).map_err(|_| {
            StoreError::Construction(format!("max_keys {} does not fit in usize", max_keys))
        })?;
        Self::bounded(capacity)
    }

    pub(crate) fn unbounded() -> Self {
        debug!("Creating unbounded store");
        Slots::Unbounded(RwLock::new(HashMap::new()))
    }

    pub(crate) fn bounded(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            StoreError::Construction("bounded store capacity must be positive".to_string())
        })?;

        debug!(capacity = capacity.get(), "Creating bounded store with LRU eviction");
        Ok(Slots::Bounded(Mutex::new(LruCache::new(capacity))))
    }

    /// Look up the entry for `key`, marking it as recently used in bounded mode.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        match self {
            Slots::Unbounded(map) => map.read().get(key).cloned(),
            Slots::Bounded(cache) => cache.lock().get(key).cloned(),
        }
    }

    /// Look up the entry for `key` without touching its recency.
    pub(crate) fn peek(&self, key: &str) -> Option<Arc<T>> {
        match self {
            Slots::Unbounded(map) => map.read().get(key).cloned(),
            Slots::Bounded(cache) => cache.lock().peek(key).cloned(),
        }
    }

    /// Mark `key` as recently used. No-op when unbounded.
    pub(crate) fn touch(&self, key: &str) {
        if let Slots::Bounded(cache) = self {
            cache.lock().promote(key);
        }
    }

    /// Return the entry for `key`, creating it with `make` if there is none.
    ///
    /// The flag is `true` only for the call that installed the entry; racing
    /// callers all receive that same entry.
    pub(crate) fn get_or_insert_with<F>(&self, key: &str, make: F) -> (Arc<T>, bool)
    where
        F: FnOnce() -> T,
    {
        // Optimistic check: the key usually exists already.
        if let Some(existing) = self.get(key) {
            return (existing, false);
        }

        match self {
            Slots::Unbounded(map) => {
                let mut map = map.write();
                match map.entry(key.to_owned()) {
                    Entry::Occupied(occupied) => (Arc::clone(occupied.get()), false),
                    Entry::Vacant(vacant) => (Arc::clone(vacant.insert(Arc::new(make()))), true),
                }
            }
            Slots::Bounded(cache) => {
                let mut cache = cache.lock();
                if let Some(existing) = cache.get(key) {
                    return (Arc::clone(existing), false);
                }

                let created = Arc::new(make());
                if let Some((evicted, _)) = cache.push(key.to_owned(), Arc::clone(&created)) {
                    trace!(key = %evicted, "Evicted least recently used key");
                }
                (created, true)
            }
        }
    }

    /// Drop every entry for which `keep` returns `false`.
    ///
    /// `keep` runs under the structural write lock. Returns the number of
    /// entries removed.
    pub(crate) fn retain<P>(&self, mut keep: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        match self {
            Slots::Unbounded(map) => {
                let mut map = map.write();
                let before = map.len();
                map.retain(|_, entry| keep(&**entry));
                before - map.len()
            }
            Slots::Bounded(cache) => {
                let mut cache = cache.lock();
                let mut doomed = Vec::new();
                for (key, entry) in cache.iter() {
                    if !keep(&**entry) {
                        doomed.push(key.clone());
                    }
                }
                for key in &doomed {
                    cache.pop(key);
                }
                doomed.len()
            }
        }
    }

    /// Number of keys currently held.
    pub(crate) fn len(&self) -> usize {
        match self {
            Slots::Unbounded(map) => map.read().len(),
            Slots::Bounded(cache) => cache.lock().len(),
        }
    }

    /// Maximum number of keys, or `None` when unbounded.
    pub(crate) fn capacity(&self) -> Option<usize> {
        match self {
            Slots::Unbounded(_) => None,
            Slots::Bounded(cache) => Some(cache.lock().cap().get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        assert_eq!(Slots::<i64>::new(0).unwrap().capacity(), None);
        assert_eq!(Slots::<i64>::new(-5).unwrap().capacity(), None);
        assert_eq!(Slots::<i64>::new(3).unwrap().capacity(), Some(3));
    }

    #[test]
    fn test_bounded_zero_capacity_rejected() {
        let result = Slots::<i64>::bounded(0);
        assert!(matches!(result, Err(StoreError::Construction(_))));
    }

    #[test]
    fn test_get_or_insert_keeps_first() {
        let slots = Slots::unbounded();

        let (first, created) = slots.get_or_insert_with("a", || 1i64);
        assert!(created);
        let (second, created) = slots.get_or_insert_with("a", || 2);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*slots.get("a").unwrap(), 1);
    }

    #[test]
    fn test_bounded_evicts_least_recently_used() {
        let slots = Slots::bounded(2).unwrap();

        slots.get_or_insert_with("a", || 1i64);
        slots.get_or_insert_with("b", || 2);
        // Touch "a" so "b" becomes the eviction candidate
        assert!(slots.get("a").is_some());
        slots.get_or_insert_with("c", || 3);

        assert_eq!(slots.len(), 2);
        assert!(slots.get("a").is_some());
        assert!(slots.get("b").is_none());
        assert!(slots.get("c").is_some());
    }

    #[test]
    fn test_peek_does_not_touch() {
        let slots = Slots::bounded(2).unwrap();

        slots.get_or_insert_with("a", || 1i64);
        slots.get_or_insert_with("b", || 2);
        assert!(slots.peek("a").is_some());
        slots.get_or_insert_with("c", || 3);

        assert!(slots.peek("a").is_none());
        assert!(slots.peek("b").is_some());
    }

    #[test]
    fn test_touch_promotes() {
        let slots = Slots::bounded(2).unwrap();

        slots.get_or_insert_with("a", || 1i64);
        slots.get_or_insert_with("b", || 2);
        slots.touch("a");
        slots.get_or_insert_with("c", || 3);

        assert!(slots.peek("a").is_some());
        assert!(slots.peek("b").is_none());
    }

    #[test]
    fn test_retain_removes_rejected_entries() {
        for slots in [Slots::unbounded(), Slots::bounded(8).unwrap()] {
            for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
                slots.get_or_insert_with(key, || i as i64);
            }

            assert_eq!(slots.retain(|v| v % 2 == 0), 2);
            assert_eq!(slots.len(), 2);
            assert!(slots.peek("a").is_some());
            assert!(slots.peek("b").is_none());
            assert!(slots.peek("c").is_some());
        }
    }
}
