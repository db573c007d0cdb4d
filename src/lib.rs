//! Ratestore - storage for rate limiter state
//!
//! This crate provides the key/counter stores a rate limiting algorithm such as
//! GCRA reads and updates on every admission check. [`store::MemStore`] is a
//! concurrency-safe in-process store with optional LRU bounding, and
//! [`store::TimedStore`] is the contract pluggable backends implement to carry
//! expiration and a shared clock.
//!
//! ```
//! use ratestore::store::{CounterStore, MemStore};
//!
//! let store = MemStore::new(10_000)?;
//! assert!(store.set_if_absent("user:123", 0)?);
//! assert!(store.compare_and_swap("user:123", 0, 1)?);
//! assert_eq!(store.get("user:123")?, 1);
//! # Ok::<(), ratestore::error::StoreError>(())
//! ```

pub mod config;
pub mod error;
pub mod store;
