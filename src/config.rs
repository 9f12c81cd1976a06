//! Factory and configuration: validates configuration and wires the
//! serializer, L1, and L2 components into a ready [`Cache`].

use crate::cache::Cache;
use crate::error::{CacheError, CacheResult};
use crate::l1::{EvictionPolicy, L1Backend};
use crate::l2::{L2Backend, L2Config, L2Protocol};
use crate::serializer::{Serializer, SerializerRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Either a registered serializer name, resolved against the process-wide
/// [`SerializerRegistry`], or a pre-built instance passed straight through.
pub enum SerializerSelection {
    Named(String),
    Instance(Arc<dyn Serializer>),
}

impl From<&str> for SerializerSelection {
    fn from(name: &str) -> Self {
        SerializerSelection::Named(name.to_string())
    }
}

impl From<Arc<dyn Serializer>> for SerializerSelection {
    fn from(instance: Arc<dyn Serializer>) -> Self {
        SerializerSelection::Instance(instance)
    }
}

/// Connectivity and tuning knobs recognized by the factory. All
/// durations are expressed in whole seconds, matching the design's
/// "seconds ≥ 1" constraints and keeping the struct `serde`-friendly without
/// a `Duration` shim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheFactoryConfig {
    pub l2_host: String,
    pub l2_port: u16,
    pub l2_db: i64,
    pub l2_password: Option<String>,
    pub l2_connect_timeout_secs: u64,
    pub l2_socket_timeout_secs: u64,
    /// `"redis"` or `"valkey"`, wire-compatible, distinguished only for
    /// logging and stats.
    pub l2_backend: String,
    /// `"ttl"` or `"lru"`.
    pub l1_backend: String,
    pub circuit_breaker_enabled: bool,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_timeout_secs: u64,
}

impl Default for CacheFactoryConfig {
    fn default() -> Self {
        Self {
            l2_host: "127.0.0.1".to_string(),
            l2_port: 6379,
            l2_db: 0,
            l2_password: None,
            l2_connect_timeout_secs: 5,
            l2_socket_timeout_secs: 5,
            l2_backend: "redis".to_string(),
            l1_backend: "lru".to_string(),
            circuit_breaker_enabled: true,
            circuit_breaker_threshold: 5,
            circuit_breaker_timeout_secs: 30,
        }
    }
}

fn parse_l1_backend(name: &str) -> CacheResult<EvictionPolicy> {
    match name {
        "ttl" => Ok(EvictionPolicy::Ttl),
        "lru" => Ok(EvictionPolicy::Lru),
        other => Err(CacheError::Configuration(format!(
            "unknown l1_backend: {other} (expected \"ttl\" or \"lru\")"
        ))),
    }
}

fn parse_l2_backend(name: &str) -> CacheResult<L2Protocol> {
    match name {
        "redis" => Ok(L2Protocol::Redis),
        "valkey" => Ok(L2Protocol::Valkey),
        other => Err(CacheError::Configuration(format!(
            "unknown l2_backend: {other} (expected \"redis\" or \"valkey\")"
        ))),
    }
}

fn resolve_serializer(selection: Option<SerializerSelection>) -> CacheResult<Arc<dyn Serializer>> {
    match selection {
        None => SerializerRegistry::global().get("pickle"),
        Some(SerializerSelection::Named(name)) => SerializerRegistry::global().get(&name),
        Some(SerializerSelection::Instance(instance)) => Ok(instance),
    }
}

/// Validates `config` plus the per-call parameters and builds L1 (if
/// enabled), L2 with its breaker and serializer (if enabled), returning a
/// ready [`Cache`]. All validation failures surface as
/// `CacheError::Configuration`, never a panic.
#[allow(clippy::too_many_arguments)]
pub fn create_cache(
    config: &CacheFactoryConfig,
    l2_key_prefix: &str,
    l2_ttl_secs: Option<u64>,
    l2_enabled: bool,
    l1_enabled: bool,
    l1_maxsize: usize,
    l1_ttl_secs: Option<u64>,
    serializer: Option<SerializerSelection>,
) -> CacheResult<Cache> {
    if !l1_enabled && !l2_enabled {
        return Err(CacheError::Configuration(
            "at least one of l1_enabled or l2_enabled must be true".to_string(),
        ));
    }
    if l1_enabled && l1_maxsize == 0 {
        return Err(CacheError::Configuration(
            "l1_maxsize must be positive".to_string(),
        ));
    }
    if l2_key_prefix.is_empty() {
        return Err(CacheError::Configuration(
            "l2_key_prefix must not be empty".to_string(),
        ));
    }
    if let Some(0) = l1_ttl_secs {
        return Err(CacheError::Configuration(
            "l1_ttl must be a positive number of seconds, or absent".to_string(),
        ));
    }
    if let Some(0) = l2_ttl_secs {
        return Err(CacheError::Configuration(
            "l2_ttl must be a positive number of seconds, or absent".to_string(),
        ));
    }
    if config.circuit_breaker_threshold < 1 {
        return Err(CacheError::Configuration(
            "circuit_breaker_threshold must be >= 1".to_string(),
        ));
    }
    if config.circuit_breaker_timeout_secs < 1 {
        return Err(CacheError::Configuration(
            "circuit_breaker_timeout must be >= 1 second".to_string(),
        ));
    }

    let serializer_instance = resolve_serializer(serializer)?;

    let l1 = if l1_enabled {
        let policy = parse_l1_backend(&config.l1_backend)?;
        Some(L1Backend::new(l1_maxsize, policy))
    } else {
        None
    };

    let l2 = if l2_enabled {
        let protocol = parse_l2_backend(&config.l2_backend)?;
        Some(L2Backend::new(L2Config {
            host: config.l2_host.clone(),
            port: config.l2_port,
            db: config.l2_db,
            password: config.l2_password.clone(),
            connect_timeout: Duration::from_secs(config.l2_connect_timeout_secs),
            socket_timeout: Duration::from_secs(config.l2_socket_timeout_secs),
            protocol,
            key_prefix: l2_key_prefix.to_string(),
            default_ttl: l2_ttl_secs.map(Duration::from_secs),
            breaker_threshold: config.circuit_breaker_threshold,
            breaker_reset_timeout: Duration::from_secs(config.circuit_breaker_timeout_secs),
            breaker_enabled: config.circuit_breaker_enabled,
        })?)
    } else {
        None
    };

    Ok(Cache::new(
        l1,
        l2,
        serializer_instance,
        l1_ttl_secs.map(Duration::from_secs),
    ))
}
