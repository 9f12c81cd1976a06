//! Benchmarks comparing the two built-in serializers against a typed value.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rescache::serializer::{JsonSerializer, PickleSerializer};
use rescache::SerializerExt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

impl User {
    fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("User {id}"),
            email: format!("user{id}@example.com"),
        }
    }
}

fn bench_serializers(c: &mut Criterion) {
    let user = User::new(1);
    let json = JsonSerializer;
    let pickle = PickleSerializer;

    let mut group = c.benchmark_group("serialize");
    group.bench_function("json", |b| b.iter(|| black_box(json.serialize(&user).unwrap())));
    group.bench_function("pickle", |b| {
        b.iter(|| black_box(pickle.serialize(&user).unwrap()))
    });
    group.finish();

    let json_bytes = json.serialize(&user).unwrap();
    let pickle_bytes = pickle.serialize(&user).unwrap();

    let mut group = c.benchmark_group("deserialize");
    group.bench_function("json", |b| {
        b.iter(|| black_box(json.deserialize::<User>(&json_bytes).unwrap()))
    });
    group.bench_function("pickle", |b| {
        b.iter(|| black_box(pickle.deserialize::<User>(&pickle_bytes).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_serializers);
criterion_main!(benches);
