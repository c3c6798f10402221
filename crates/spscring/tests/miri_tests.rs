//! Miri-compatible tests for detecting undefined behavior.
//!
//! Run with: `cargo +nightly miri test -p spscring --no-default-features --test miri_tests`
//!
//! These exercise the unsafe slot accesses of the heap-backed variants:
//! uninitialized reads, out-of-bounds pointer arithmetic and aliasing through
//! `UnsafeCell`. Huge-page storage is skipped (Miri cannot model `mmap`).

use spscring::{
    BoundedBuffer, CachedCursorBuffer, Config, HeapStorage, LockFreeBuffer, SharedRing, Storage,
};
use std::thread;

/// Fill and drain several times so every slot is reused across the wrap.
#[test]
fn miri_lockfree_wrap_around() {
    let (mut tx, mut rx) = LockFreeBuffer::<u32>::new(4).unwrap().split();
    for round in 0..3 {
        for i in 0..4 {
            assert!(tx.enqueue(round * 10 + i), "enqueue failed at round {round} item {i}");
        }
        assert!(!tx.enqueue(99));
        for i in 0..4 {
            assert_eq!(rx.dequeue(), Some(round * 10 + i));
        }
        assert_eq!(rx.dequeue(), None);
    }
}

#[test]
fn miri_cached_wrap_around() {
    let (mut tx, mut rx) = CachedCursorBuffer::<u64>::new(2).unwrap().split();
    for i in 0..7 {
        assert!(tx.enqueue(i));
        assert_eq!(rx.dequeue(), Some(i));
    }
    assert!(tx.enqueue(100));
    assert!(tx.enqueue(101));
    assert!(!tx.enqueue(102));
    assert_eq!(rx.dequeue(), Some(100));
    assert_eq!(rx.dequeue(), Some(101));
}

/// An empty dequeue must not read an uninitialized slot.
#[test]
fn miri_dequeue_empty_never_reads() {
    let (_tx, mut rx) = CachedCursorBuffer::<[u8; 16]>::new(8).unwrap().split();
    assert_eq!(rx.dequeue(), None);

    let mut seq = BoundedBuffer::<[u8; 16]>::new(3).unwrap();
    assert_eq!(seq.dequeue(), None);
}

/// Storage provided by the caller goes through the same pointer arithmetic.
#[test]
fn miri_from_storage_larger_than_config() {
    let storage = HeapStorage::<u16>::allocate(16).unwrap();
    let ring = LockFreeBuffer::<u16, _>::from_storage(Config::from(4), storage).unwrap();
    let (mut tx, mut rx) = ring.split();
    for i in 0..4 {
        assert!(tx.enqueue(i));
    }
    // Mask confines indices to the first four slots.
    assert!(!tx.enqueue(4));
    for i in 0..4 {
        assert_eq!(rx.dequeue(), Some(i));
    }
}

/// Two real threads; Miri's data race detector checks the slot handoff.
#[test]
fn miri_cached_two_threads() {
    const N: u64 = 50;
    let (mut tx, mut rx) = CachedCursorBuffer::<u64>::new(4).unwrap().split();

    let producer = thread::spawn(move || {
        for i in 0..N {
            while !tx.enqueue(i) {
                thread::yield_now();
            }
        }
    });

    let mut expected = 0;
    while expected < N {
        match rx.dequeue() {
            Some(v) => {
                assert_eq!(v, expected);
                expected += 1;
            }
            None => thread::yield_now(),
        }
    }
    producer.join().unwrap();
}

#[test]
fn miri_lockfree_two_threads() {
    const N: u64 = 50;
    let (mut tx, mut rx) = LockFreeBuffer::<u64>::new(2).unwrap().split();

    let producer = thread::spawn(move || {
        for i in 0..N {
            while !tx.enqueue(i) {
                thread::yield_now();
            }
        }
    });

    let received: Vec<u64> = (0..N)
        .map(|_| loop {
            if let Some(v) = rx.dequeue() {
                break v;
            }
            thread::yield_now();
        })
        .collect();
    producer.join().unwrap();
    assert_eq!(received, (0..N).collect::<Vec<_>>());
}
