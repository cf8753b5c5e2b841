//! Performance benchmarks for memcache-typed
//!
//! This benchmark suite measures:
//! - Entry codec (encode + frame, unframe + decode) across payload sizes
//! - Cache operations over the in-memory backend (put, get hit/miss, get_or_load)
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memcache_typed::backend::InMemoryBackend;
use memcache_typed::codec::{decode, encode, from_bytes, to_bytes};
use memcache_typed::{Cache, Cacheable, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Benchmark Fixtures
// ============================================================================

/// Benchmark value with configurable data size
#[derive(Clone, Serialize, Deserialize)]
struct BenchValue {
    id: String,
    labels: Vec<String>,
    note: Option<String>,
}

impl Cacheable for BenchValue {
    fn type_tag() -> &'static str {
        "bench_value"
    }
}

impl BenchValue {
    fn new(id: &str, size: usize) -> Self {
        BenchValue {
            id: id.to_string(),
            labels: (0..size / 10).map(|i| format!("label{:04}", i)).collect(),
            note: None,
        }
    }
}

fn registry() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::with_defaults().with::<BenchValue>())
}

fn bench_cache() -> Cache<InMemoryBackend> {
    Cache::new("bench", Duration::from_secs(300), InMemoryBackend::new()).with_registry(registry())
}

// ============================================================================
// Group 1: Codec Benchmarks
// ============================================================================

fn codec_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let registry = registry();

    for size in [100, 1_000, 10_000].iter() {
        let value = BenchValue::new("bench", *size);

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("encode", size), &value, |b, value| {
                b.iter(|| {
                    let entry = encode(Some(black_box(value)))
                        .expect("Failed to encode")
                        .expect("Value present");
                    to_bytes(&entry).expect("Failed to frame")
                });
            });

        let entry = encode(Some(&value))
            .expect("Failed to encode")
            .expect("Value present");
        let bytes = to_bytes(&entry).expect("Failed to frame");
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("decode", size), &bytes, |b, bytes| {
                b.iter(|| {
                    let entry = from_bytes(black_box(bytes)).expect("Failed to unframe");
                    decode(Some(&entry), &registry).expect("Failed to decode")
                });
            });
    }

    group.finish();
}

// ============================================================================
// Group 2: Cache Benchmarks
// ============================================================================

fn cache_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("put", size), size, |b, &size| {
                let cache = bench_cache();
                let value = BenchValue::new("bench", size);

                b.to_async(&rt).iter(|| async {
                    cache
                        .put(black_box("bench_put"), black_box(&value))
                        .await
                        .expect("Failed to put")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let cache = bench_cache();
                rt.block_on(async {
                    cache
                        .put("bench_hit", &BenchValue::new("bench", size))
                        .await
                        .expect("Failed to put");
                });

                b.to_async(&rt).iter(|| async {
                    cache
                        .get_as::<BenchValue, _>(black_box("bench_hit"))
                        .await
                        .expect("Failed to get")
                });
            });
    }

    // Size doesn't matter for misses
    group.bench_function("get_miss", |b| {
        let cache = bench_cache();

        b.to_async(&rt)
            .iter(|| async { cache.get(black_box("nonexistent_key")).await });
    });

    // Measures: lookup miss + loader + encode + store
    group.bench_function("get_or_load_miss", |b| {
        let cache = bench_cache();
        let counter = AtomicU32::new(0);

        b.to_async(&rt).iter(|| async {
            // Unique key per iteration to force a miss
            let current = counter.fetch_add(1, Ordering::Relaxed);
            cache
                .get_or_load(&format!("bench_miss_{}", current), || async {
                    Ok::<_, String>(Some(BenchValue::new("bench", 1_000)))
                })
                .await
                .expect("Failed to load")
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(benches, codec_benchmarks, cache_benchmarks);
criterion_main!(benches);
