//! Benchmark for draw resolution performance.
//!
//! Run with: cargo bench --package lootdraw --bench draw_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lootdraw::pity::{self, PityConfig};
use lootdraw::rng::ChaChaSource;
use lootdraw::selector;
use lootdraw::{DrawEngine, DrawSettings, EngineConfig, Item, Pool, Rarity, RarityTable};

fn create_test_pool() -> Pool {
    // 20 items per tier
    let items = Rarity::ALL
        .into_iter()
        .enumerate()
        .flat_map(|(tier, rarity)| {
            (0..20u32).map(move |i| {
                let id = (tier as u32) * 100 + i;
                Item::new(id, format!("Item_{id}"), rarity)
            })
        })
        .collect();
    Pool::new("standard", items).with_featured(vec![400, 401])
}

fn create_engine() -> DrawEngine {
    let config = EngineConfig {
        settings: DrawSettings {
            seed: Some(42),
            ..DrawSettings::default()
        },
        pools: vec![create_test_pool()],
    };
    DrawEngine::new(config).unwrap()
}

fn benchmark_adjust(c: &mut Criterion) {
    let table = RarityTable::standard();
    let cfg = PityConfig::default();

    c.bench_function("adjust_soft_pity", |b| {
        b.iter(|| black_box(pity::adjust(&table, black_box(82), Rarity::Common, &cfg)))
    });
}

fn benchmark_select(c: &mut Criterion) {
    let pool = create_test_pool();
    let weights = pity::adjust(&RarityTable::standard(), 1, Rarity::Common, &PityConfig::default()).unwrap();
    let mut rng = ChaChaSource::from_seed(7);

    c.bench_function("select_item", |b| {
        b.iter(|| black_box(selector::select(&weights, &pool, 0.5, &mut rng)))
    });
}

fn benchmark_draw_single(c: &mut Criterion) {
    let engine = create_engine();

    c.bench_function("engine_draw_single", |b| {
        b.iter(|| black_box(engine.draw_single("standard")));
        engine.drain_events();
    });
}

fn benchmark_draw_ten(c: &mut Criterion) {
    let engine = create_engine();

    c.bench_function("engine_draw_ten", |b| {
        b.iter(|| black_box(engine.draw_ten("standard")));
        engine.drain_events();
    });
}

criterion_group!(
    benches,
    benchmark_adjust,
    benchmark_select,
    benchmark_draw_single,
    benchmark_draw_ten,
);
criterion_main!(benches);
