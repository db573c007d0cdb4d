//! Error types for ratestore.

use thiserror::Error;

/// Main error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key has no entry: it was never set, was evicted, or has expired.
    ///
    /// Callers should treat this as "counter at baseline", not as a failure.
    #[error("no such key")]
    NotFound,

    /// The store could not be constructed (invalid capacity)
    #[error("Construction error: {0}")]
    Construction(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure reported by a timed store backend
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap a backend-specific failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Backend(err.into())
    }

    /// Returns `true` if this is the "no such key" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
