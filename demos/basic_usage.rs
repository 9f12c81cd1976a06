//! Basic Usage Example
//!
//! Demonstrates simple cache operations: set, get, delete, and stats.
//!
//! Run with: cargo run --example basic_usage

use rescache::{create_cache, CacheFactoryConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Resilient Cache: Basic Usage ===\n");

    let config = CacheFactoryConfig::default();
    let cache = create_cache(&config, "demo", Some(3600), true, true, 10_000, Some(300), None)?;

    let user = serde_json::json!({
        "id": 1,
        "name": "Alice",
        "email": "alice@example.com",
    });

    println!("Storing user:1 ...");
    cache.set("user:1", &user, None)?;

    if let Some(cached) = cache.get::<serde_json::Value>("user:1")? {
        println!("Retrieved: {cached}");
    }

    println!("Exists? {}", cache.exists("user:1")?);

    let stats = cache.get_stats();
    if let Some(l1) = stats.l1 {
        println!("L1: {} / {} entries, {} hits, {} misses", l1.size, l1.maxsize, l1.hits, l1.misses);
    }
    if let Some(l2) = stats.l2 {
        println!("L2: connected={}, breaker={:?}", l2.connected, l2.breaker_state);
    }

    cache.delete("user:1")?;
    println!("Deleted. exists? {}", cache.exists("user:1")?);

    Ok(())
}
