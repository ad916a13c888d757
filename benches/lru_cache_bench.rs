//! LRU cache performance benchmarks
//!
//! Compares the evicting cache against a plain `Mutex<HashMap>` and measures
//! the cost of eviction with and without registered callbacks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use evicache::{EvictionCallback, LruCache, LruCacheConfig};
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

const CAPACITIES: &[usize] = &[64, 1024, 16384];
const WORKLOAD: usize = 10_000;

fn keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key_{}", i)).collect()
}

fn quiet_cache(capacity: usize) -> LruCache<u64> {
    let config = LruCacheConfig {
        enable_statistics: false,
        ..LruCacheConfig::with_capacity(capacity)
    };
    LruCache::with_config(config).unwrap()
}

/// Insert and lookup against a mutex-guarded HashMap
fn bench_lru_vs_hashmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_vs_hashmap");
    let keys = keys(WORKLOAD);

    for &capacity in CAPACITIES {
        group.throughput(Throughput::Elements(WORKLOAD as u64));

        group.bench_with_input(BenchmarkId::new("lru_insert", capacity), &capacity, |b, &cap| {
            b.iter(|| {
                let cache = quiet_cache(cap);
                for (i, key) in keys.iter().enumerate() {
                    black_box(cache.add_or_update(key, Arc::new(i as u64), None).unwrap());
                }
                cache
            });
        });

        group.bench_with_input(BenchmarkId::new("hashmap_insert", capacity), &capacity, |b, _| {
            b.iter(|| {
                let map = Mutex::new(HashMap::new());
                for (i, key) in keys.iter().enumerate() {
                    black_box(map.lock().unwrap().insert(key.clone(), Arc::new(i as u64)));
                }
                map
            });
        });

        let hot = &keys[..capacity.min(WORKLOAD)];

        group.bench_with_input(BenchmarkId::new("lru_get_hot", capacity), &capacity, |b, &cap| {
            let cache = quiet_cache(cap);
            for (i, key) in hot.iter().enumerate() {
                cache.add_or_update(key, Arc::new(i as u64), None).unwrap();
            }
            b.iter(|| {
                for key in hot {
                    black_box(cache.try_get(key).unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("hashmap_get", capacity), &capacity, |b, _| {
            let map = Mutex::new(HashMap::new());
            for (i, key) in hot.iter().enumerate() {
                map.lock().unwrap().insert(key.clone(), Arc::new(i as u64));
            }
            b.iter(|| {
                for key in hot {
                    black_box(map.lock().unwrap().get(key).cloned());
                }
            });
        });
    }

    group.finish();
}

/// Eviction-heavy inserts, with and without a callback per entry
fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");
    let keys = keys(WORKLOAD);
    group.throughput(Throughput::Elements(WORKLOAD as u64));

    group.bench_function("no_callback", |b| {
        let cache = quiet_cache(128);
        b.iter(|| {
            for (i, key) in keys.iter().enumerate() {
                black_box(cache.add_or_update(key, Arc::new(i as u64), None).unwrap());
            }
        });
    });

    group.bench_function("with_callback", |b| {
        let cache = quiet_cache(128);
        let cb = EvictionCallback::new(|key| {
            black_box(key.len());
        });
        b.iter(|| {
            for (i, key) in keys.iter().enumerate() {
                black_box(cache.add_or_update(key, Arc::new(i as u64), Some(cb.clone())).unwrap());
            }
            cache.flush_notifications();
        });
    });

    group.finish();
}

/// Zipf-like mixed workload: 80% reads, 20% writes
fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");
    let keys = keys(4096);

    for &capacity in &[256usize, 1024] {
        group.throughput(Throughput::Elements(WORKLOAD as u64));
        group.bench_with_input(BenchmarkId::new("80r_20w", capacity), &capacity, |b, &cap| {
            let cache = quiet_cache(cap);
            let mut rng = rand::rngs::StdRng::seed_from_u64(42);
            let ops: Vec<(bool, usize)> = (0..WORKLOAD)
                .map(|_| {
                    // Square the draw to skew toward low indices
                    let r: f64 = rng.gen();
                    (rng.gen_bool(0.8), ((r * r) * keys.len() as f64) as usize)
                })
                .collect();

            b.iter(|| {
                for &(read, idx) in &ops {
                    let key = &keys[idx];
                    if read {
                        black_box(cache.try_get(key).unwrap());
                    } else {
                        black_box(cache.add_or_update(key, Arc::new(idx as u64), None).unwrap());
                    }
                }
            });
        });
    }

    group.finish();
}

/// Contention across threads sharing one cache
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    let keys = Arc::new(keys(2048));

    for &threads in &[2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1000) as u64));
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &n| {
            let cache = Arc::new(quiet_cache(1024));
            b.iter(|| {
                let handles: Vec<_> = (0..n)
                    .map(|t| {
                        let cache = Arc::clone(&cache);
                        let keys = Arc::clone(&keys);
                        thread::spawn(move || {
                            for i in 0..1000 {
                                let key = &keys[(t * 1000 + i) % keys.len()];
                                if i % 4 == 0 {
                                    cache.add_or_update(key, Arc::new(i as u64), None).unwrap();
                                } else {
                                    black_box(cache.try_get(key).unwrap());
                                }
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lru_vs_hashmap,
    bench_eviction,
    bench_mixed_workload,
    bench_concurrent
);
criterion_main!(benches);
