//! Counter store trait for in-process rate limiter state.

use crate::error::Result;

/// A concurrency-safe mapping from key to `i64` counter.
///
/// This is the primitive set a rate limiting algorithm needs to keep one
/// counter per key: read, first-writer-wins initialization and atomic
/// compare-and-swap. Implementations must be shareable across threads.
pub trait CounterStore: Send + Sync {
    /// Get the current value for `key`.
    ///
    /// Returns [`StoreError::NotFound`](crate::error::StoreError::NotFound) if the
    /// key was never set or has been evicted.
    fn get(&self, key: &str) -> Result<i64>;

    /// Set `key` to `value` only if it has no entry.
    ///
    /// Returns `true` if this call created the entry. When several callers race
    /// on a new key exactly one of them sees `true`; the rest see `false` and the
    /// winner's value.
    fn set_if_absent(&self, key: &str, value: i64) -> Result<bool>;

    /// Atomically set `key` to `new` if its current value equals `old`.
    ///
    /// Returns `Ok(false)` when the key exists but holds a different value, and
    /// [`StoreError::NotFound`](crate::error::StoreError::NotFound) when it does
    /// not exist.
    fn compare_and_swap(&self, key: &str, old: i64, new: i64) -> Result<bool>;
}
