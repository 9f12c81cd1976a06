//! Shared test infrastructure for integration tests.

use rescache::{create_cache, Cache, CacheFactoryConfig};

pub fn redis_host_port() -> (String, u16) {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let without_scheme = url.trim_start_matches("redis://");
    let mut parts = without_scheme.splitn(2, ':');
    let host = parts.next().unwrap_or("127.0.0.1").to_string();
    let port = parts.next().and_then(|p| p.parse().ok()).unwrap_or(6379);
    (host, port)
}

/// Builds a two-tier cache against `REDIS_URL` (or the default local
/// address) under a unique prefix, or `None` if Redis isn't reachable, in
/// which case the caller should log and skip rather than fail the suite.
pub fn two_tier_cache(prefix: &str) -> Option<Cache> {
    let (host, port) = redis_host_port();
    let mut config = CacheFactoryConfig::default();
    config.l2_host = host;
    config.l2_port = port;
    let cache = create_cache(&config, prefix, Some(300), true, true, 1_000, Some(60), None).ok()?;
    if cache.get_stats().l2.map(|s| s.connected).unwrap_or(false) {
        Some(cache)
    } else {
        None
    }
}

pub fn unique_prefix(name: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test_{name}_{nanos}")
}
