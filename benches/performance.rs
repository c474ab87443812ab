//! Performance benchmarks for the threat cache.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use threat_cache::{Asset, Locale, MemoryBackend, RecordId, ThreatStore};

const TYPE_COUNT: u64 = 50;
const ASSET_COUNT: u64 = 200;

fn create_store(threat_count: u64) -> ThreatStore<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.seed(
        "threat_types",
        (0..TYPE_COUNT).map(|id| {
            let name = json!({"en": format!("Type {}", id), "es": format!("Tipo {}", id)});
            json!({"id": id, "name": name.to_string()})
        }),
    );
    backend.seed(
        "threats",
        (0..threat_count).map(|id| {
            json!({
                "id": TYPE_COUNT + id,
                "threat_type_id": id % TYPE_COUNT,
                "asset_id": id % ASSET_COUNT,
                "description": "benchmark threat",
            })
        }),
    );

    let mut store = ThreatStore::new(backend);
    store.fetch_all_threat_types().unwrap();
    store.fetch_all_threats().unwrap();
    store
}

fn assets() -> Vec<Asset> {
    (0..ASSET_COUNT)
        .map(|id| Asset {
            id: RecordId(id),
            name: format!("Asset {}", id),
            extra: Default::default(),
        })
        .collect()
}

/// Benchmark the joined view, which decodes every name map on each read
fn bench_merged_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("merged_view");
    let assets = assets();
    let active = Locale::from("es");

    for threat_count in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("threats", threat_count),
            &threat_count,
            |b, &count| {
                let store = create_store(count);
                b.iter(|| {
                    black_box(store.merged_threats(&active, &assets).unwrap());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a full fetch-all round trip through the in-memory backend
fn bench_fetch_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_all");

    for threat_count in [100, 1000, 10000] {
        group.bench_with_input(
            BenchmarkId::new("threats", threat_count),
            &threat_count,
            |b, &count| {
                let mut store = create_store(count);
                b.iter(|| {
                    black_box(store.fetch_all_threats().unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_merged_view, bench_fetch_all);
criterion_main!(benches);
