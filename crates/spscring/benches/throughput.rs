use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spscring::{
    split, BoundedBuffer, CachedCursorBuffer, LockFreeBuffer, LockedBuffer, SharedRing,
    LOW_LATENCY_CONFIG,
};
use std::thread;

const MESSAGES: u64 = 1_000_000;
const BATCH_SIZE: u64 = 1000;

/// Batch enqueue then batch dequeue on one thread: pure per-operation cost.
fn run_single_thread<R: SharedRing<Item = u64>>(ring: R) {
    let (mut tx, mut rx) = split(ring);
    for round in 0..MESSAGES / BATCH_SIZE {
        for i in 0..BATCH_SIZE {
            tx.enqueue(round * BATCH_SIZE + i);
        }
        for _ in 0..BATCH_SIZE {
            black_box(rx.dequeue());
        }
    }
}

/// Producer and consumer on separate threads, busy-polling.
fn run_two_threads<R: SharedRing<Item = u64> + 'static>(ring: R) {
    let (mut tx, mut rx) = split(ring);
    let producer = thread::spawn(move || {
        for i in 0..MESSAGES {
            while !tx.enqueue(i) {
                std::hint::spin_loop();
            }
        }
    });

    let mut received = 0;
    while received < MESSAGES {
        if let Some(v) = rx.dequeue() {
            black_box(v);
            received += 1;
        }
    }
    producer.join().unwrap();
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let mut buf = BoundedBuffer::<u64>::new(LOW_LATENCY_CONFIG.capacity).unwrap();
            for round in 0..MESSAGES / BATCH_SIZE {
                for i in 0..BATCH_SIZE {
                    buf.enqueue(round * BATCH_SIZE + i);
                }
                for _ in 0..BATCH_SIZE {
                    black_box(buf.dequeue());
                }
            }
        });
    });
    group.bench_function("locked", |b| {
        b.iter(|| run_single_thread(LockedBuffer::with_config(LOW_LATENCY_CONFIG).unwrap()));
    });
    group.bench_function("lockfree", |b| {
        b.iter(|| run_single_thread(LockFreeBuffer::with_config(LOW_LATENCY_CONFIG).unwrap()));
    });
    group.bench_function("cached", |b| {
        b.iter(|| run_single_thread(CachedCursorBuffer::with_config(LOW_LATENCY_CONFIG).unwrap()));
    });

    group.finish();
}

fn bench_two_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_threads");
    group.throughput(Throughput::Elements(MESSAGES));
    group.sample_size(20);

    for capacity in [1024usize, 65536] {
        group.bench_with_input(BenchmarkId::new("locked", capacity), &capacity, |b, &cap| {
            b.iter(|| run_two_threads(LockedBuffer::new(cap).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("lockfree", capacity), &capacity, |b, &cap| {
            b.iter(|| run_two_threads(LockFreeBuffer::new(cap).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("cached", capacity), &capacity, |b, &cap| {
            b.iter(|| run_two_threads(CachedCursorBuffer::new(cap).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_two_threads);
criterion_main!(benches);
