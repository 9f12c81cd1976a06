//! Throughput benchmarks for plain get/set through the two-level coordinator.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rescache::{create_cache, CacheFactoryConfig};

fn redis_url_parts() -> (String, u16) {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let without_scheme = url.trim_start_matches("redis://");
    let mut parts = without_scheme.splitn(2, ':');
    let host = parts.next().unwrap_or("127.0.0.1").to_string();
    let port = parts.next().and_then(|p| p.parse().ok()).unwrap_or(6379);
    (host, port)
}

fn bench_l1_only_set_get(c: &mut Criterion) {
    let config = CacheFactoryConfig::default();
    let cache = create_cache(&config, "bench", None, false, true, 10_000, None, None)
        .expect("l1-only cache should build without touching the network");

    let mut group = c.benchmark_group("l1_only");
    group.bench_function("set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            cache
                .set(&format!("k{i}"), &i, None)
                .expect("l1 set is infallible");
        });
    });
    group.bench_function("get_hit", |b| {
        cache.set("hit", &42u64, None).unwrap();
        b.iter(|| cache.get::<u64>("hit").unwrap());
    });
    group.finish();
}

fn bench_two_tier_set_get(c: &mut Criterion) {
    let (host, port) = redis_url_parts();
    let mut config = CacheFactoryConfig::default();
    config.l2_host = host;
    config.l2_port = port;

    let Ok(cache) =
        create_cache(&config, "bench_two_tier", Some(60), true, true, 10_000, Some(30), None)
    else {
        eprintln!("skipping two-tier benchmark: could not build cache");
        return;
    };
    if !cache.get_stats().l2.map(|s| s.connected).unwrap_or(false) {
        eprintln!("skipping two-tier benchmark: REDIS_URL unreachable");
        return;
    }

    let mut group = c.benchmark_group("two_tier");
    for size in [1usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("set", size), &size, |b, &size| {
            let value = "x".repeat(size);
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                cache.set(&format!("two_tier:{i}"), &value, None).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_l1_only_set_get, bench_two_tier_set_get);
criterion_main!(benches);
