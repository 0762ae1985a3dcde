use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use river_core::config::QueueConfig;
use river_core::enrich::Enricher;
use river_core::event::{EventPayload, RawEvent, StayTime};
use river_core::queue::IngestionQueue;
use river_core::scheduler::{FixedDeadline, ManualScheduler};
use river_core::telemetry::TelemetryRecorder;

fn drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_drain");

    for &items in &[100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(items as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |b, &items| {
            b.iter(|| {
                let sched = Arc::new(ManualScheduler::new());
                let queue = IngestionQueue::new(&QueueConfig::default(), sched.clone(), TelemetryRecorder::new());
                let seen = Arc::new(AtomicU64::new(0));
                let s = seen.clone();
                queue.connect(Arc::new(move |item: u64| {
                    s.fetch_add(black_box(item), Ordering::Relaxed);
                    Ok(())
                }));

                for i in 0..items as u64 {
                    queue.enqueue(i);
                }
                queue.start();
                while sched.run_next_idle_with(&FixedDeadline::generous()) {}
                black_box(seen.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn enrich(c: &mut Criterion) {
    let recorder = TelemetryRecorder::new();
    let enricher = Enricher::new(Arc::new(ManualScheduler::new()), recorder);
    enricher
        .hooks()
        .tap_sync("beforeBuild", |m| {
            m.user_id = Some("0123456789abcdef0123456789abcdef".into());
            m.trace_id = Some("AbCdEfGhIj".into());
            Ok(())
        })
        .expect("beforeBuild is declared");

    c.bench_function("enrich_stay_time", |b| {
        b.iter(|| {
            let raw = RawEvent::new("https://app.example/", EventPayload::Time(StayTime { duration: 1.5 }));
            black_box(enricher.process(raw))
        })
    });
}

criterion_group!(benches, drain, enrich);
criterion_main!(benches);
