use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use herald_emitter::{Emitter, Listener, NoopSink};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// Benchmark: Synchronous dispatch
// ============================================================================

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for listeners in [1usize, 8, 64] {
        let emitter: Emitter<&'static str, u64> =
            Emitter::builder().sink(Arc::new(NoopSink)).build();
        let total = Arc::new(AtomicU64::new(0));
        for _ in 0..listeners {
            let total = Arc::clone(&total);
            emitter
                .on(
                    "tick",
                    Listener::new(move |n: &u64| {
                        total.fetch_add(*n, Ordering::Relaxed);
                    }),
                )
                .unwrap();
        }

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(BenchmarkId::new("listeners", listeners), &emitter, |b, e| {
            b.iter(|| black_box(e.emit(black_box(&"tick"), 1)));
        });
    }

    group.bench_function("no_listeners", |b| {
        let emitter: Emitter<&'static str, u64> = Emitter::new();
        b.iter(|| black_box(emitter.emit(black_box(&"nobody"), 1)));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Subscription churn
// ============================================================================

fn bench_subscribe(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe");
    let emitter: Emitter<&'static str, u64> = Emitter::builder().sink(Arc::new(NoopSink)).build();
    let listener = Listener::new(|_: &u64| {});

    group.bench_function("on_unsubscribe", |b| {
        b.iter(|| {
            let unsubscribe = emitter.on("tick", listener.clone()).unwrap();
            unsubscribe.unsubscribe();
        });
    });

    group.bench_function("on_off", |b| {
        b.iter(|| {
            emitter.on("tick", listener.clone()).unwrap();
            black_box(emitter.off(&"tick", &listener));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_emit, bench_subscribe);
criterion_main!(benches);
