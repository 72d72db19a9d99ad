//! Dispatch Benchmarks
//!
//! Compares direct callbacks against dynamic bindings, and measures the
//! cost of going through the registry.
//!
//! Run with: cargo bench --bench dispatch_benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use herald::prelude::*;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

struct Counter {
    total: AtomicU64,
}

impl Reflect for Counter {
    fn register_methods(methods: &mut MethodTableBuilder<Self>) {
        methods
            .method("tick", |counter| {
                counter.total.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .method_with("add", "amount", |counter, amount: &u64| {
                counter.total.fetch_add(*amount, Ordering::Relaxed);
                Ok(())
            });
    }
}

fn counter() -> Arc<Counter> {
    Arc::new(Counter {
        total: AtomicU64::new(0),
    })
}

// ============================================================================
// Event Dispatch
// ============================================================================

fn bench_event_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_dispatch");

    for listeners in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(listeners as u64));

        let target = counter();
        let direct: Signal = Event::new("direct");
        for _ in 0..listeners {
            let target = target.clone();
            direct.add_listener(Callback::action(move || {
                target.total.fetch_add(1, Ordering::Relaxed);
            }));
        }
        group.bench_with_input(BenchmarkId::new("callbacks", listeners), &direct, |b, event| {
            b.iter(|| black_box(event.fire()))
        });

        let bound: Signal = Event::new("bound");
        for _ in 0..listeners {
            bound.add_binding(DynamicBinding::to_component(
                ComponentRef::new(ObjectId::new(), &target),
                "tick",
            ));
        }
        group.bench_with_input(BenchmarkId::new("bindings", listeners), &bound, |b, event| {
            b.iter(|| black_box(event.fire()))
        });

        let typed: Event<u64> = Event::new("typed");
        for _ in 0..listeners {
            typed.add_binding(DynamicBinding::to_component(
                ComponentRef::new(ObjectId::new(), &target),
                "add",
            ));
        }
        group.bench_with_input(BenchmarkId::new("bindings_u64", listeners), &typed, |b, event| {
            b.iter(|| black_box(event.invoke(black_box(&3))))
        });
    }

    group.finish();
}

// ============================================================================
// Registry
// ============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    let registry: EventRegistry = RegistryBuilder::new().enable_logging(false).build();

    for i in 0..1_000 {
        registry.add_event(&format!("event-{}", i), EventKind::Signal);
    }
    registry.add_listener("event-500", Callback::action(|| {}));

    group.bench_function("invoke_by_key", |b| {
        b.iter(|| black_box(registry.invoke(black_box("event-500"), false)))
    });

    group.bench_function("add_remove_listener", |b| {
        let callback = Callback::action(|| {});
        b.iter(|| {
            registry.add_listener("event-1", callback.clone());
            black_box(registry.remove_listener("event-1", &callback))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_event_dispatch, bench_registry);
criterion_main!(benches);
