//! Benchmarks for the evidence engine
//!
//! Run with: cargo bench -p aingle_evidence

use std::sync::Arc;

use aingle_evidence::{BuiltinRules, Catalog, InferenceEngine, Predicate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SYMPTOMS: [&str; 8] = [
    "fever",
    "cough",
    "shortness_of_breath",
    "fatigue",
    "headache",
    "chills",
    "sore_throat",
    "body_ache",
];

fn symptoms(catalog: &Catalog, count: usize) -> Vec<Predicate> {
    SYMPTOMS
        .iter()
        .take(count)
        .filter_map(|alias| catalog.symptom(alias).cloned())
        .collect()
}

/// Benchmark catalog parsing
fn bench_catalog_load(c: &mut Criterion) {
    c.bench_function("catalog/respiratory", |b| {
        b.iter(|| black_box(BuiltinRules::respiratory()));
    });
}

/// Benchmark a batch assertion followed by one recompute
fn bench_assert_facts(c: &mut Criterion) {
    let mut group = c.benchmark_group("Assert Facts");
    let catalog = BuiltinRules::respiratory();
    let rules = Arc::new(catalog.rules().clone());

    for count in [1, 4, 8].iter() {
        let facts = symptoms(&catalog, *count);
        group.bench_with_input(BenchmarkId::new("symptoms", count), count, |b, _| {
            b.iter(|| {
                let engine = InferenceEngine::new(Arc::clone(&rules));
                black_box(engine.assert_facts("patient", facts.clone()))
            });
        });
    }

    group.finish();
}

/// Benchmark incremental assertion, one recompute per fact
fn bench_incremental(c: &mut Criterion) {
    let catalog = BuiltinRules::respiratory();
    let rules = Arc::new(catalog.rules().clone());
    let facts = symptoms(&catalog, SYMPTOMS.len());

    c.bench_function("incremental/8_symptoms", |b| {
        b.iter(|| {
            let engine = InferenceEngine::new(Arc::clone(&rules));
            for fact in facts.iter() {
                black_box(engine.assert_fact("patient", fact.clone()));
            }
        });
    });
}

/// Benchmark queries against a populated context
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("Queries");
    let catalog = BuiltinRules::respiratory();
    let engine = InferenceEngine::new(catalog.rules().clone());
    engine.assert_facts("patient", symptoms(&catalog, SYMPTOMS.len()));

    group.bench_function("ranked_diagnoses", |b| {
        b.iter(|| black_box(engine.ranked_diagnoses("patient")));
    });

    group.bench_function("facts", |b| {
        b.iter(|| black_box(engine.facts("patient")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_catalog_load,
    bench_assert_facts,
    bench_incremental,
    bench_queries
);
criterion_main!(benches);
