//! Time-aware store contract for pluggable backends.
//!
//! A GCRA limiter needs three things from shared storage: the stored value
//! together with the storage's own notion of "now", first-writer-wins
//! initialization, and compare-and-swap. Backends may be in-memory, a
//! replicated key-value store or a database, as long as each operation is
//! atomic and all cooperating instances read the same clock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// A value read from a [`TimedStore`] together with the backend's time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedValue {
    /// The stored value, or `None` if the key has no live entry.
    ///
    /// Absence is never folded into a zero value, so callers can tell
    /// "counter at zero" apart from "no state yet".
    pub value: Option<i64>,
    /// The backend's current time at the moment of the read.
    pub now: DateTime<Utc>,
}

impl TimedValue {
    /// Backend time in nanoseconds since the Unix epoch.
    ///
    /// Saturates at `i64::MAX` for times past the year 2262.
    pub fn now_nanos(&self) -> i64 {
        self.now.timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

/// Storage contract for rate limiter state with expiration.
///
/// Implementations must honor:
/// - atomicity of every individual operation,
/// - first-writer-wins on [`set_if_not_exists`](TimedStore::set_if_not_exists),
/// - exact-match semantics on [`compare_and_swap`](TimedStore::compare_and_swap),
/// - a single time source shared by every instance using the same state.
///
/// Backend failures are returned as [`StoreError::Backend`](crate::error::StoreError::Backend)
/// and are never retried by the store itself.
#[async_trait]
pub trait TimedStore: Send + Sync {
    /// Get the value of `key` and the backend's current time.
    async fn get_with_time(&self, key: &str) -> Result<TimedValue>;

    /// Set `key` to `value` only if it has no live entry.
    ///
    /// Returns whether a new value was set. If the backend supports expiring
    /// keys, a newly set key expires after `ttl`.
    async fn set_if_not_exists(&self, key: &str, value: i64, ttl: Duration) -> Result<bool>;

    /// Atomically set `key` to `new` if its current value equals `old`.
    ///
    /// Returns `Ok(false)` both on a mismatch and when the key does not exist.
    /// If the backend supports expiring keys and the swap succeeded, the key
    /// expires after `ttl` from now.
    async fn compare_and_swap(&self, key: &str, old: i64, new: i64, ttl: Duration)
        -> Result<bool>;
}
