use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use atelier_core::{SkuId, VariantKey};
use atelier_infra::{InMemoryStockStore, MovementContext, StockEngine, StockStore};
use atelier_ledger::{replay, Balances, Movement, MovementDraft, MovementKind};

/// Naive balance store: direct map updates, no ledger, no history.
#[derive(Debug, Clone)]
struct NaiveBalanceStore {
    inner: Arc<RwLock<HashMap<SkuId, Balances>>>,
}

impl NaiveBalanceStore {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn create(&self, sku_id: SkuId) {
        let mut map = self.inner.write().unwrap();
        map.insert(sku_id, Balances::ZERO);
    }

    fn adjust(&self, sku_id: SkuId, delta: i64) -> Result<(), ()> {
        let mut map = self.inner.write().unwrap();
        if let Some(balances) = map.get_mut(&sku_id) {
            balances.physical += delta;
            Ok(())
        } else {
            Err(())
        }
    }

    fn reserve(&self, sku_id: SkuId, quantity: i64) -> Result<(), ()> {
        let mut map = self.inner.write().unwrap();
        if let Some(balances) = map.get_mut(&sku_id) {
            if balances.available() < quantity {
                return Err(());
            }
            balances.reserved += quantity;
            Ok(())
        } else {
            Err(())
        }
    }
}

fn setup_engine() -> StockEngine<InMemoryStockStore> {
    StockEngine::new(InMemoryStockStore::new())
}

fn variant(n: u64) -> VariantKey {
    VariantKey::new(format!("BM-{n:06}"), "preto", "M").unwrap()
}

fn bench_movement_apply_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("movement_apply_latency");
    group.sample_size(1000);

    // Benchmark: first movement on a fresh SKU (row creation + append)
    group.bench_function("stock_in_fresh_sku", |b| {
        let engine = setup_engine();
        let ctx = MovementContext::system();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let sku = engine.store().find_or_create_sku(&variant(n)).unwrap();
            engine
                .apply(
                    &MovementDraft::new(sku.id, MovementKind::StockInPurchase, black_box(10)),
                    &ctx,
                )
                .unwrap();
        });
    });

    // Benchmark: adjustments against one SKU with a growing ledger
    group.bench_function("adjust_with_history", |b| {
        let engine = setup_engine();
        let ctx = MovementContext::system();
        let sku = engine.store().find_or_create_sku(&variant(0)).unwrap();

        b.iter(|| {
            engine
                .apply(
                    &MovementDraft::new(sku.id, MovementKind::AdjustPositive, black_box(5)),
                    &ctx,
                )
                .unwrap();
        });
    });

    group.finish();
}

fn bench_batch_apply_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_apply_throughput");

    for batch_size in [1, 10, 100].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("apply_all", batch_size),
            batch_size,
            |b, &size| {
                let engine = setup_engine();
                let ctx = MovementContext::system();
                // One line per SKU, the way a multi-line order reserves.
                let drafts: Vec<MovementDraft> = (0..size)
                    .map(|n| {
                        let sku = engine.store().find_or_create_sku(&variant(n as u64)).unwrap();
                        MovementDraft::new(sku.id, MovementKind::AdjustPositive, 1)
                    })
                    .collect();

                b.iter(|| {
                    black_box(engine.apply_all(&drafts, &ctx).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_ledger_replay_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_replay_speed");

    for movement_count in [10, 100, 1000, 10000].iter() {
        group.bench_with_input(
            BenchmarkId::new("replay_history", movement_count),
            movement_count,
            |b, &count| {
                let sku_id = SkuId::new();
                // Pre-generate a history that keeps balances valid as it
                // grows: stock in, then alternating reserve/release.
                let mut movements = vec![Movement::new(
                    sku_id,
                    MovementKind::StockInPurchase,
                    count as i64,
                    Utc::now(),
                    "bench",
                )
                .unwrap()];
                for i in 0..(count - 1) {
                    let kind = if i % 2 == 0 {
                        MovementKind::Reserve
                    } else {
                        MovementKind::ReleaseReserve
                    };
                    movements.push(Movement::new(sku_id, kind, 1, Utc::now(), "bench").unwrap());
                }

                b.iter(|| {
                    black_box(replay(black_box(&movements)));
                });
            },
        );
    }

    group.finish();
}

fn bench_engine_vs_naive_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_vs_naive_updates");
    group.sample_size(1000);

    // Benchmark: ledgered path (append + versioned balance commit)
    group.bench_function("engine_stock_in_and_reserve", |b| {
        let engine = setup_engine();
        let ctx = MovementContext::system();
        let mut n = 0u64;

        b.iter(|| {
            n += 1;
            let sku = engine.store().find_or_create_sku(&variant(n)).unwrap();
            engine
                .apply(
                    &MovementDraft::new(sku.id, MovementKind::StockInPurchase, 10),
                    &ctx,
                )
                .unwrap();
            engine
                .apply(&MovementDraft::new(sku.id, MovementKind::Reserve, 4), &ctx)
                .unwrap();
        });
    });

    // Benchmark: bare map updates (what the ledger costs on top of)
    group.bench_function("naive_stock_in_and_reserve", |b| {
        let store = NaiveBalanceStore::new();
        let sku_id = SkuId::new();
        store.create(sku_id);

        b.iter(|| {
            store.adjust(sku_id, 10).unwrap();
            store.reserve(sku_id, 4).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_movement_apply_latency,
    bench_batch_apply_throughput,
    bench_ledger_replay_speed,
    bench_engine_vs_naive_updates
);
criterion_main!(benches);
