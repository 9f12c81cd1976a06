//! Error taxonomy shared by every component of the cache.
//!
//! Rust has no class hierarchy, so the three-kind taxonomy described by the
//! design ("`CacheError` → `ConnectionError` | `SerializationError`") is
//! rendered as one `thiserror`-derived enum with one variant per kind, plus
//! `Configuration` for factory-time validation failures.

use thiserror::Error;

/// The single error type returned by every fallible operation in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// L2 connectivity, timeout, authentication, or protocol failure; also
    /// raised when the circuit breaker short-circuits a call.
    #[error("connection error: {0}")]
    Connection(String),

    /// A serializer failed to encode or decode a value. Never counts toward
    /// the circuit breaker: it is a data-format defect, not a liveness one.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid `CacheFactoryConfig`, raised only at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl CacheError {
    /// True for the kind the circuit breaker counts as a failure.
    pub fn is_connection(&self) -> bool {
        matches!(self, CacheError::Connection(_))
    }
}

/// Crate-wide result alias.
pub type CacheResult<T> = Result<T, CacheError>;
