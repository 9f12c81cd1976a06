//! Resilient Two-Level Cache
//!
//! A process-local (L1) + remote (L2, Redis/Valkey-protocol) cache with a
//! synchronous API that survives L2 outages without raising errors to
//! callers. The central contract: serve reads from the nearest available
//! tier, keep tiers weakly consistent under concurrent updates, and degrade
//! gracefully to L1-only behavior while L2 is unreachable.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use rescache::{create_cache, CacheFactoryConfig};
//!
//! let config = CacheFactoryConfig::default();
//! let cache = create_cache(&config, "app", Some(3600), true, true, 10_000, Some(60), None)
//!     .expect("valid configuration");
//!
//! cache.set("user:1", &"alice", None).expect("set never fails with both tiers up");
//! let value: Option<String> = cache.get("user:1").expect("get absorbs L2 outages");
//! assert_eq!(value.as_deref(), Some("alice"));
//! ```
//!
//! # Architecture
//!
//! - [`serializer`]: pluggable, object-safe `Serializer` trait plus the
//!   process-wide registry and the `json`/`pickle` built-ins.
//! - [`l1`]: bounded in-process map with exact-capacity eviction.
//! - [`l2`]: Redis/Valkey client with key prefixing and failure
//!   classification.
//! - [`circuit_breaker`]: three-state gate wrapping L2 calls.
//! - [`cache`]: the `Cache` handle that sequences L1/L2 operations.
//! - [`config`]: `CacheFactoryConfig` and `create_cache`.
//! - [`error`]: the `CacheError` taxonomy shared by every component.
//!
//! # Non-goals
//!
//! Strong cross-instance consistency, distributed invalidation/pub-sub,
//! write-behind batching, cache stampede protection (single-flight
//! coalescing), transactions spanning L1+L2, and persistence of L1 across
//! process restarts are explicitly out of scope. Multiple concurrent misses
//! on the same key may all fall through to L2; callers needing coalescing
//! must add it themselves.

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod l1;
pub mod l2;
pub mod serializer;

pub use cache::{Cache, CacheStats, ClearReport};
pub use circuit_breaker::BreakerState;
pub use config::{create_cache, CacheFactoryConfig, SerializerSelection};
pub use error::{CacheError, CacheResult};
pub use l1::EvictionPolicy;
pub use l2::L2Protocol;
pub use serializer::{Serializer, SerializerExt, SerializerRegistry};
