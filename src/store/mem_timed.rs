//! In-memory timed store.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::clock::{Clock, SystemClock};
use super::slots::Slots;
use super::timed::{TimedStore, TimedValue};
use crate::error::Result;

/// Expiration marker for entries stored with a zero TTL.
const NEVER: i64 = i64::MAX;

struct EntryState {
    value: i64,
    /// Expiration instant in nanoseconds since the Unix epoch.
    expires_at: i64,
    /// Set once the entry has been purged from the map.
    removed: bool,
}

impl EntryState {
    fn is_live(&self, now: i64) -> bool {
        !self.removed && now < self.expires_at
    }
}

/// Value and expiry live under one lock so liveness check, comparison and
/// refresh happen as a single step.
struct TimedEntry {
    state: Mutex<EntryState>,
}

impl TimedEntry {
    fn new(value: i64, expires_at: i64) -> Self {
        Self {
            state: Mutex::new(EntryState {
                value,
                expires_at,
                removed: false,
            }),
        }
    }
}

fn expiry(now: i64, ttl: Duration) -> i64 {
    if ttl.is_zero() {
        return NEVER;
    }
    let ttl = i64::try_from(ttl.as_nanos()).unwrap_or(i64::MAX);
    now.saturating_add(ttl)
}

/// A [`TimedStore`] kept in process memory.
///
/// Entries expire lazily: an expired entry reads as absent and is revived in
/// place by the next successful `set_if_not_exists`. A zero TTL stores an
/// entry that never expires. With `max_keys > 0` the store is bounded with LRU
/// eviction, exactly like [`MemStore`](super::MemStore); reads of expired
/// entries do not refresh their recency, so they are the first to go.
///
/// Without a key limit, expired entries stay in memory until
/// [`purge_expired`](MemTimedStore::purge_expired) is called. There is no
/// background sweeper.
///
/// Only instances in the same process share this state; the clock is the one
/// passed at construction.
pub struct MemTimedStore<C: Clock = SystemClock> {
    slots: Slots<TimedEntry>,
    clock: C,
}

impl MemTimedStore<SystemClock> {
    /// Create a timed store on the system clock.
    pub fn new(max_keys: i64) -> Result<Self> {
        Self::with_clock(max_keys, SystemClock::new())
    }
}

impl<C: Clock> MemTimedStore<C> {
    /// Create a timed store reading time from `clock`.
    pub fn with_clock(max_keys: i64, clock: C) -> Result<Self> {
        Ok(Self {
            slots: Slots::new(max_keys)?,
            clock,
        })
    }

    /// The clock this store reports time from.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key limit, or `None` for an unbounded store.
    pub fn capacity(&self) -> Option<usize> {
        self.slots.capacity()
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.now_nanos();
        let purged = self.slots.retain(|entry| {
            let mut state = entry.state.lock();
            if state.is_live(now) {
                return true;
            }
            // Callers still holding this entry must not revive or swap it.
            state.removed = true;
            false
        });

        if purged > 0 {
            trace!(purged, "Purged expired entries");
        }
        purged
    }

    fn now_nanos(&self) -> i64 {
        self.clock.now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl<C: Clock> TimedStore for MemTimedStore<C> {
    async fn get_with_time(&self, key: &str) -> Result<TimedValue> {
        let Some(entry) = self.slots.peek(key) else {
            return Ok(TimedValue {
                value: None,
                now: self.clock.now(),
            });
        };

        let (value, now) = {
            let state = entry.state.lock();
            let now = self.clock.now();
            let now_nanos = now.timestamp_nanos_opt().unwrap_or(i64::MAX);
            (state.is_live(now_nanos).then_some(state.value), now)
        };

        if value.is_some() {
            self.slots.touch(key);
        }
        Ok(TimedValue { value, now })
    }

    async fn set_if_not_exists(&self, key: &str, value: i64, ttl: Duration) -> Result<bool> {
        loop {
            let (entry, created) = self
                .slots
                .get_or_insert_with(key, || TimedEntry::new(value, expiry(self.now_nanos(), ttl)));
            if created {
                return Ok(true);
            }

            let mut state = entry.state.lock();
            if state.removed {
                // Purged between lookup and lock; look the key up again.
                continue;
            }

            let now = self.now_nanos();
            if state.is_live(now) {
                return Ok(false);
            }

            state.value = value;
            state.expires_at = expiry(now, ttl);
            return Ok(true);
        }
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        old: i64,
        new: i64,
        ttl: Duration,
    ) -> Result<bool> {
        let Some(entry) = self.slots.peek(key) else {
            return Ok(false);
        };

        {
            let mut state = entry.state.lock();
            let now = self.now_nanos();
            if !state.is_live(now) || state.value != old {
                return Ok(false);
            }

            state.value = new;
            state.expires_at = expiry(now, ttl);
        }

        // Recency is only refreshed once the entry lock is released.
        self.slots.touch(key);
        Ok(true)
    }
}
