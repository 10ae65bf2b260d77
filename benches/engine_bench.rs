use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use inrep_rs::simulation::simulate_sessions;
use inrep_rs::{
    select_next, CatDesign, Estimator, Item, ItemBank, ItemId, LikertScale, ResponseRecord, Stage,
    StoppingRule,
};

fn make_bank(n: usize) -> ItemBank {
    let items = (0..n)
        .map(|j| {
            let b = -2.5 + 5.0 * j as f64 / (n - 1) as f64;
            let a = 0.7 + 0.1 * (j % 10) as f64;
            Item::new(format!("Q{j:04}"), a, b, j % 3 == 0).unwrap()
        })
        .collect();
    ItemBank::new(LikertScale::default(), items).unwrap()
}

fn make_responses(bank: &ItemBank, n: usize) -> Vec<ResponseRecord> {
    bank.items()
        .iter()
        .take(n)
        .enumerate()
        .map(|(j, item)| bank.record_response(item.id(), 1 + (j % 5) as i32).unwrap())
        .collect()
}

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");
    let bank = make_bank(200);
    let estimator = Estimator::default();

    for n in [5, 20, 100] {
        let responses = make_responses(&bank, n);
        group.bench_with_input(BenchmarkId::new("newton", n), &responses, |b, responses| {
            b.iter(|| estimator.estimate(black_box(&bank), black_box(responses)))
        });
    }
    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    for n in [50, 500, 5000] {
        let pool = make_bank(n).pool();
        group.bench_with_input(BenchmarkId::new("adaptive", n), &pool, |b, pool| {
            b.iter(|| select_next(black_box(pool), black_box(0.3), Stage::Adaptive, &[]))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let bank = make_bank(60);
    let sessions: Vec<Vec<ResponseRecord>> = (0..1000).map(|_| make_responses(&bank, 20)).collect();
    let estimator = Estimator::default();
    c.bench_function("estimate_batch_1000", |b| {
        b.iter(|| estimator.estimate_batch(black_box(&bank), black_box(&sessions)))
    });
}

fn bench_simulation(c: &mut Criterion) {
    let bank = Arc::new(make_bank(100));
    let design = CatDesign {
        fixed_items: (0..5).map(|j| ItemId::new(format!("Q{:04}", 45 + j))).collect(),
        stopping: StoppingRule {
            max_items: 20,
            min_items: 5,
            min_sem: Some(0.4),
        },
    };
    let estimator = Estimator::default();
    let thetas = [-2.0, -1.0, 0.0, 1.0, 2.0];
    c.bench_function("simulate_sessions_5x20", |b| {
        b.iter(|| simulate_sessions(&bank, &estimator, &design, black_box(&thetas), 20, 42))
    });
}

criterion_group!(benches, bench_estimate, bench_select, bench_batch, bench_simulation);
criterion_main!(benches);
