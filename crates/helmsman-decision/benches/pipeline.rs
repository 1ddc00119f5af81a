//! Helmsman decision benchmarks
//!
//! Critical paths:
//! - Contract validation + state adaptation
//! - Policy selection on a warm table
//! - Full `process` round trip
//! - Learning updates
//! - Snapshot save / load

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use helmsman_common::{Action, LearningConfig};
use helmsman_decision::{validate, DecisionBridge, PolicyEngine, StateAdapter};
use serde_json::{json, Value};

const ENVS: [&str; 3] = ["dev", "stage", "prod"];
const BANDS: [&str; 3] = ["healthy", "degraded", "failing"];

fn events(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "app": format!("svc-{}", i % 64),
                "env": ENVS[i % ENVS.len()],
                "state": BANDS[(i / 3) % BANDS.len()],
                "latency_ms": (i * 37 % 900) as f64,
                "errors_last_min": i % 7
            })
        })
        .collect()
}

fn warm_engine(events: &[Value]) -> Arc<PolicyEngine> {
    let engine = Arc::new(PolicyEngine::new(LearningConfig::default()));
    let adapter = StateAdapter::default();
    for (i, raw) in events.iter().enumerate() {
        if let Ok(event) = validate(raw) {
            let state = adapter.adapt(&event);
            let action = Action::ALL[i % Action::COUNT];
            let _ = engine.update(&state, action, (i % 11) as f64 - 5.0, None);
        }
    }
    engine
}

// ============ INGRESS BENCHMARKS ============

fn bench_ingress(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingress");
    let adapter = StateAdapter::default();
    let raw = events(1).remove(0);

    group.bench_function("validate", |b| {
        b.iter(|| validate(black_box(&raw)));
    });

    group.bench_function("validate_and_adapt", |b| {
        b.iter(|| validate(black_box(&raw)).map(|event| adapter.adapt(&event)));
    });

    group.finish();
}

// ============ POLICY BENCHMARKS ============

fn bench_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");
    group.measurement_time(Duration::from_secs(5));

    for size in [64usize, 1024, 8192].iter() {
        let batch = events(*size);
        let engine = warm_engine(&batch);
        let adapter = StateAdapter::default();
        let states: Vec<_> = batch
            .iter()
            .filter_map(|raw| validate(raw).ok())
            .map(|event| adapter.adapt(&event))
            .collect();

        group.bench_with_input(BenchmarkId::new("select", size), &states, |b, states| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % states.len();
                engine.select(black_box(&states[i]))
            });
        });

        group.bench_with_input(BenchmarkId::new("update", size), &states, |b, states| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % states.len();
                let next = &states[(i + 1) % states.len()];
                engine.update(black_box(&states[i]), Action::ScaleUp, 1.0, Some(next))
            });
        });
    }

    group.finish();
}

// ============ BRIDGE BENCHMARKS ============

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("bridge");
    let batch = events(1024);
    let bridge = DecisionBridge::new(warm_engine(&batch));

    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("process_batch", |b| {
        b.iter(|| {
            for raw in &batch {
                black_box(bridge.process(raw));
            }
        });
    });

    let invalid = json!({"app": "svc", "env": "Prod", "state": "healthy"});
    group.bench_function("process_rejected", |b| {
        b.iter(|| bridge.process(black_box(&invalid)));
    });

    group.finish();
}

// ============ PERSISTENCE BENCHMARKS ============

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let engine = warm_engine(&events(4096));
    let snapshot = engine.save();

    group.bench_function("save", |b| {
        b.iter(|| engine.save());
    });

    group.bench_function("to_json", |b| {
        b.iter(|| snapshot.to_json());
    });

    group.bench_function("load", |b| {
        let target = PolicyEngine::new(LearningConfig::default());
        b.iter(|| target.load(black_box(&snapshot)));
    });

    group.finish();
}

criterion_group!(ingress, bench_ingress);
criterion_group!(policy, bench_policy);
criterion_group!(bridge, bench_process);
criterion_group!(snapshot, bench_snapshot);

criterion_main!(ingress, policy, bridge, snapshot);
