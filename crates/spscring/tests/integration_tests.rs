use spscring::{
    split, Backoff, CachedCursorBuffer, Config, Consumer, LockFreeBuffer, LockedBuffer, Producer,
    RetryPolicy, RingError, SharedRing, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG,
};
use std::thread;

/// Streams `0..n` from a producer thread and checks order on the consumer.
fn assert_fifo_across_threads<R>(ring: R, n: u64)
where
    R: SharedRing<Item = u64> + 'static,
{
    let (mut tx, mut rx) = split(ring);

    let producer = thread::spawn(move || {
        let mut backoff = Backoff::new();
        for i in 0..n {
            while !tx.enqueue(i) {
                RetryPolicy::Adaptive.pause(&mut backoff);
            }
            backoff.reset();
        }
        tx
    });

    let mut backoff = Backoff::new();
    let mut expected = 0;
    while expected < n {
        match rx.dequeue() {
            Some(v) => {
                assert_eq!(v, expected, "FIFO violation: expected {}, got {}", expected, v);
                expected += 1;
                backoff.reset();
            }
            None => backoff.snooze(),
        }
    }

    let tx = producer.join().unwrap();
    assert_eq!(rx.dequeue(), None);
    assert!(tx.is_empty());

    let m = rx.metrics();
    assert_eq!(m.enqueued, n);
    assert_eq!(m.dequeued, n);
}

#[test]
fn test_fifo_locked() {
    assert_fifo_across_threads(LockedBuffer::new(64).unwrap(), 50_000);
}

#[test]
fn test_fifo_lockfree() {
    assert_fifo_across_threads(LockFreeBuffer::new(64).unwrap(), 200_000);
}

#[test]
fn test_fifo_cached() {
    assert_fifo_across_threads(CachedCursorBuffer::new(64).unwrap(), 200_000);
}

#[test]
fn test_fifo_capacity_one_lockfree() {
    // Every item forces the producer to wait for the consumer.
    assert_fifo_across_threads(LockFreeBuffer::new(1).unwrap(), 10_000);
    assert_fifo_across_threads(CachedCursorBuffer::new(1).unwrap(), 10_000);
}

#[cfg(all(feature = "huge-pages", target_os = "linux"))]
#[test]
fn test_fifo_huge_pages() {
    let ring = spscring::HugePageBuffer::<u64>::with_storage(LOW_LATENCY_CONFIG).unwrap();
    assert_fifo_across_threads(ring, 100_000);
}

/// A third thread sampling counters while both sides run never sees more
/// items dequeued than enqueued.
fn assert_snapshots_ordered<R>(ring: &R, n: u64)
where
    R: SharedRing<Item = u64>,
{
    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..n {
                // SAFETY: this is the only thread enqueueing.
                while !unsafe { ring.enqueue_unchecked(i) } {
                    thread::yield_now();
                }
            }
        });
        s.spawn(|| {
            for expected in 0..n {
                // SAFETY: this is the only thread dequeueing.
                let v = loop {
                    match unsafe { ring.dequeue_unchecked() } {
                        Some(v) => break v,
                        None => thread::yield_now(),
                    }
                };
                assert_eq!(v, expected);
            }
        });
        s.spawn(|| {
            for _ in 0..1_000_000 {
                let m = ring.metrics();
                assert!(
                    m.dequeued <= m.enqueued,
                    "snapshot dequeued {} > enqueued {}",
                    m.dequeued,
                    m.enqueued
                );
                assert!(ring.len() <= ring.capacity());
                if m.dequeued == n {
                    break;
                }
                thread::yield_now();
            }
        });
    });

    let m = ring.metrics();
    assert_eq!((m.enqueued, m.dequeued), (n, n));
}

#[test]
fn test_metrics_snapshot_ordered_lockfree() {
    assert_snapshots_ordered(&LockFreeBuffer::new(4).unwrap(), 20_000);
}

#[test]
fn test_metrics_snapshot_ordered_cached() {
    assert_snapshots_ordered(&CachedCursorBuffer::new(4).unwrap(), 20_000);
}

#[test]
fn test_batch_rounds_single_thread() {
    // Producer fills a batch, consumer drains it; repeated.
    const BATCH: u64 = 1000;
    let (mut tx, mut rx) = CachedCursorBuffer::<u64>::with_config(LOW_LATENCY_CONFIG.with_metrics(true))
        .unwrap()
        .split();

    for round in 0..50 {
        for i in 0..BATCH {
            assert!(tx.enqueue(round * BATCH + i));
        }
        for i in 0..BATCH {
            assert_eq!(rx.dequeue(), Some(round * BATCH + i));
        }
    }

    let m = rx.metrics();
    assert_eq!(m.enqueued, 50 * BATCH);
    assert_eq!(m.full_failures, 0);
    assert_eq!(m.empty_failures, 0);
    // One consumer refresh per batch; the producer's cache only runs out once
    // the cursors pass the capacity.
    assert_eq!(m.consumer_refreshes, 50);
    assert!(m.producer_refreshes < 50);
}

#[test]
fn test_item_larger_than_cache_line() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Wide([u64; 16]);

    let (mut tx, mut rx) = LockFreeBuffer::<Wide>::new(4).unwrap().split();
    for i in 0..4 {
        assert!(tx.enqueue(Wide([i; 16])));
    }
    for i in 0..4 {
        assert_eq!(rx.dequeue(), Some(Wide([i; 16])));
    }
}

#[test]
fn test_retry_policy_waits_for_consumer() {
    let (mut tx, mut rx): (Producer<CachedCursorBuffer<u32>>, Consumer<_>) =
        CachedCursorBuffer::new(1).unwrap().split();
    assert!(tx.enqueue(1));

    let consumer = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(5));
        let first = rx.dequeue();
        (first, rx)
    });

    let policy = RetryPolicy::Sleep {
        interval: std::time::Duration::from_millis(1),
        attempts: 1_000,
    };
    assert!(spscring::Enqueue::enqueue_with(&mut tx, 2, &policy));

    let (first, mut rx) = consumer.join().unwrap();
    assert_eq!(first, Some(1));
    assert_eq!(rx.dequeue(), Some(2));
}

#[test]
fn test_construction_errors_reported() {
    assert!(matches!(
        LockFreeBuffer::<u8>::new(0),
        Err(RingError::ZeroCapacity)
    ));
    assert!(matches!(
        CachedCursorBuffer::<u8>::new(1000),
        Err(RingError::NotPowerOfTwo { capacity: 1000 })
    ));
    let err = LockedBuffer::<u8>::new(3).unwrap_err();
    assert!(err.is_construction());
    assert!(!err.is_recoverable());
}

#[test]
fn test_presets() {
    assert_eq!(LOW_LATENCY_CONFIG.capacity, 4096);
    assert_eq!(HIGH_THROUGHPUT_CONFIG.capacity, 2 * 1024 * 1024);
    assert_eq!(Config::default(), HIGH_THROUGHPUT_CONFIG);

    let ring = LockFreeBuffer::<u32>::with_config(LOW_LATENCY_CONFIG).unwrap();
    assert_eq!(ring.capacity(), 4096);
}
