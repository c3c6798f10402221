use crate::config::{Config, Indexing};
use crate::error::{Result, RingError};
use crate::handle::SharedRing;
use crate::invariants::{
    assert_refresh_monotonic, debug_assert_bounded_count, debug_assert_read_not_past_write,
};
use crate::metrics::{MetricsSnapshot, SideCounters};
use crate::storage::{HeapStorage, Storage};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(all(feature = "huge-pages", target_os = "linux"))]
use crate::huge_pages::HugePageStorage;

// =============================================================================
// CACHED CURSORS
// =============================================================================
//
// Same Acquire/Release protocol as `LockFreeBuffer`, plus one private copy of
// the other side's cursor per side:
//
// - `cached_read`: written and read only by the producer
// - `cached_write`: written and read only by the consumer
//
// **Producer (enqueue):**
// 1. Load `write_cursor` with Relaxed
// 2. If `write - cached_read < capacity`, there is space: skip to step 5
// 3. Otherwise refresh: load `read_cursor` with Acquire into `cached_read`
// 4. Still `write - read == capacity` after refresh: full
// 5. Plain write into the slot, store `write + 1` with Release
//
// **Consumer (dequeue):** the mirror image with `cached_write`.
//
// A cached cursor can only lag the real one (the other side only moves
// forward), so the fast path never overestimates available space or items.
// When producer and consumer run at similar rates the refresh happens once per
// batch of `capacity` items instead of once per item.
//
// The cache fields are plain `UnsafeCell<u64>`: no other thread ever touches
// them, so atomics would only add cost.
//
// =============================================================================

/// Lock-free SPSC ring buffer that caches the other side's cursor.
///
/// Layout: one cache line per hot field. Each side's cursor and each side's
/// cache live on separate lines, so the fast path touches only lines owned by
/// the calling thread.
#[repr(C)]
pub struct CachedCursorBuffer<T, S = HeapStorage<T>> {
    // === PRODUCER HOT ===
    write_cursor: CachePadded<AtomicU64>,
    /// Producer's view of `read_cursor`; may lag.
    cached_read: CachePadded<UnsafeCell<u64>>,
    producer_counters: CachePadded<SideCounters>,

    // === CONSUMER HOT ===
    read_cursor: CachePadded<AtomicU64>,
    /// Consumer's view of `write_cursor`; may lag.
    cached_write: CachePadded<UnsafeCell<u64>>,
    consumer_counters: CachePadded<SideCounters>,

    // === COLD STATE ===
    config: Config,
    mask: u64,
    storage: S,
    _marker: PhantomData<T>,
}

/// Cached-cursor buffer whose slots live in huge pages.
#[cfg(all(feature = "huge-pages", target_os = "linux"))]
pub type HugePageBuffer<T> = CachedCursorBuffer<T, HugePageStorage<T>>;

// Safety: `cached_read` is only accessed from the producer side and
// `cached_write` only from the consumer side (see `SharedRing` contract); the
// slots follow the same cursor protocol as `LockFreeBuffer`.
unsafe impl<T: Send, S: Storage<T>> Send for CachedCursorBuffer<T, S> {}
unsafe impl<T: Send, S: Storage<T>> Sync for CachedCursorBuffer<T, S> {}

impl<T: Copy + Send> CachedCursorBuffer<T> {
    /// Creates a heap-backed buffer with `capacity` slots (power of two).
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::from(capacity))
    }

    /// Creates a heap-backed buffer from a full configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_storage(config)
    }
}

impl<T: Copy + Send, S: Storage<T>> CachedCursorBuffer<T, S> {
    /// Creates a buffer whose slots come from the storage strategy `S`.
    ///
    /// ```
    /// use spscring::{CachedCursorBuffer, Config, HeapStorage, SharedRing};
    ///
    /// let ring = CachedCursorBuffer::<u64, HeapStorage<u64>>::with_storage(Config::from(8))?;
    /// let (mut tx, mut rx) = ring.split();
    /// assert!(tx.enqueue(42));
    /// assert_eq!(rx.dequeue(), Some(42));
    /// # Ok::<(), spscring::RingError>(())
    /// ```
    pub fn with_storage(config: Config) -> Result<Self> {
        config.validate(Indexing::Mask)?;
        Self::from_storage(config, S::allocate(config.capacity)?)
    }

    /// Creates a buffer over already-acquired storage.
    pub fn from_storage(config: Config, storage: S) -> Result<Self> {
        config.validate(Indexing::Mask)?;
        if storage.capacity() < config.capacity {
            return Err(RingError::StorageTooSmall {
                required: config.capacity,
                available: storage.capacity(),
            });
        }
        tracing::debug!(
            capacity = config.capacity,
            metrics = config.enable_metrics,
            "created cached-cursor ring buffer"
        );
        Ok(Self {
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            cached_read: CachePadded::new(UnsafeCell::new(0)),
            producer_counters: CachePadded::new(SideCounters::new()),
            read_cursor: CachePadded::new(AtomicU64::new(0)),
            cached_write: CachePadded::new(UnsafeCell::new(0)),
            consumer_counters: CachePadded::new(SideCounters::new()),
            config,
            mask: config.mask() as u64,
            storage,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Returns the current number of items in the ring.
    pub fn len(&self) -> usize {
        let read = self.read_cursor.load(Ordering::Acquire);
        let write = self.write_cursor.load(Ordering::Acquire);
        write.saturating_sub(read) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.config.capacity
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get a snapshot of the cursors and (if enabled) refresh/failure counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        // read first, as in `len`, so `dequeued <= enqueued` in every snapshot.
        let dequeued = self.read_cursor.load(Ordering::Acquire);
        let enqueued = self.write_cursor.load(Ordering::Acquire);
        MetricsSnapshot {
            enqueued,
            dequeued,
            producer_refreshes: self.producer_counters.refreshes(),
            consumer_refreshes: self.consumer_counters.refreshes(),
            full_failures: self.producer_counters.failures(),
            empty_failures: self.consumer_counters.failures(),
        }
    }

    #[inline]
    fn slot(&self, pos: u64) -> *mut MaybeUninit<T> {
        let idx = (pos & self.mask) as usize;
        // SAFETY: idx < capacity <= storage.capacity().
        unsafe { self.storage.as_ptr().add(idx) }
    }

    /// Producer slow path: reload the read cursor into the producer's cache.
    #[cold]
    #[inline(never)]
    fn refresh_read(&self, write: u64) -> u64 {
        // SAFETY: cached_read is only accessed by the producer (this code path).
        let cached = unsafe { *self.cached_read.get() };
        let fresh = self.read_cursor.load(Ordering::Acquire);
        assert_refresh_monotonic!("read cursor", cached, fresh, cached, write);
        // SAFETY: as above.
        unsafe { *self.cached_read.get() = fresh };
        if self.config.enable_metrics {
            self.producer_counters.record_refresh();
        }
        fresh
    }

    /// Consumer slow path: reload the write cursor into the consumer's cache.
    #[cold]
    #[inline(never)]
    fn refresh_write(&self, read: u64) -> u64 {
        // SAFETY: cached_write is only accessed by the consumer (this code path).
        let cached = unsafe { *self.cached_write.get() };
        let fresh = self.write_cursor.load(Ordering::Acquire);
        let upper = read.wrapping_add(self.config.capacity as u64);
        assert_refresh_monotonic!("write cursor", cached, fresh, read, upper);
        // SAFETY: as above.
        unsafe { *self.cached_write.get() = fresh };
        if self.config.enable_metrics {
            self.consumer_counters.record_refresh();
        }
        fresh
    }
}

unsafe impl<T: Copy + Send, S: Storage<T>> SharedRing for CachedCursorBuffer<T, S> {
    type Item = T;

    #[inline]
    fn capacity(&self) -> usize {
        self.config.capacity
    }

    fn len(&self) -> usize {
        CachedCursorBuffer::len(self)
    }

    fn metrics(&self) -> MetricsSnapshot {
        CachedCursorBuffer::metrics(self)
    }

    #[inline]
    unsafe fn enqueue_unchecked(&self, item: T) -> bool {
        let write = self.write_cursor.load(Ordering::Relaxed);
        let capacity = self.config.capacity as u64;

        // Fast path: check cached read cursor
        // SAFETY: cached_read is only accessed by the producer.
        let mut read = unsafe { *self.cached_read.get() };
        if write.wrapping_sub(read) >= capacity {
            read = self.refresh_read(write);
            if write.wrapping_sub(read) >= capacity {
                if self.config.enable_metrics {
                    self.producer_counters.record_failure();
                }
                return false;
            }
        }

        debug_assert_bounded_count!(write.wrapping_sub(read) + 1, capacity);

        // SAFETY: the slot at `write` was released by the consumer no later
        // than the read cursor we observed with Acquire (now or at an earlier
        // refresh), and only the producer writes ahead of `read + capacity`.
        unsafe { self.slot(write).write(MaybeUninit::new(item)) };

        self.write_cursor
            .store(write.wrapping_add(1), Ordering::Release);
        true
    }

    #[inline]
    unsafe fn dequeue_unchecked(&self) -> Option<T> {
        let read = self.read_cursor.load(Ordering::Relaxed);

        // Fast path: check cached write cursor
        // SAFETY: cached_write is only accessed by the consumer.
        let mut write = unsafe { *self.cached_write.get() };
        if write == read {
            write = self.refresh_write(read);
            if write == read {
                if self.config.enable_metrics {
                    self.consumer_counters.record_failure();
                }
                return None;
            }
        }

        debug_assert_read_not_past_write!(read.wrapping_add(1), write);

        // SAFETY: read < write, and the slot was published by a Release store
        // of the write cursor that we observed with Acquire.
        let item = unsafe { self.slot(read).read().assume_init() };

        self.read_cursor
            .store(read.wrapping_add(1), Ordering::Release);
        Some(item)
    }
}

impl<T, S: fmt::Debug> fmt::Debug for CachedCursorBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCursorBuffer")
            .field("capacity", &self.config.capacity)
            .field("write_cursor", &self.write_cursor.load(Ordering::Relaxed))
            .field("read_cursor", &self.read_cursor.load(Ordering::Relaxed))
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;
    use std::thread;

    const CACHE_LINE: usize = 64;

    #[test]
    fn test_hot_fields_on_separate_cache_lines() {
        type B = CachedCursorBuffer<u64>;
        let offsets = [
            offset_of!(B, write_cursor),
            offset_of!(B, cached_read),
            offset_of!(B, producer_counters),
            offset_of!(B, read_cursor),
            offset_of!(B, cached_write),
            offset_of!(B, consumer_counters),
            offset_of!(B, config),
        ];
        for pair in offsets.windows(2) {
            assert!(
                pair[1] - pair[0] >= CACHE_LINE,
                "fields at {} and {} share a cache line",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_cached_capacity_four_scenario() {
        let (mut tx, mut rx) = CachedCursorBuffer::<i32>::new(4).unwrap().split();
        assert_eq!(rx.dequeue(), None);
        for i in 1..=4 {
            assert!(tx.enqueue(i));
        }
        assert!(!tx.enqueue(5));
        for i in 1..=4 {
            assert_eq!(rx.dequeue(), Some(i));
        }
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn test_refresh_only_on_cache_miss() {
        let ring = CachedCursorBuffer::<u32>::with_config(Config::new(4, true)).unwrap();
        let (mut tx, mut rx) = ring.split();

        // Cached read cursor starts at 0: four free slots without a refresh.
        for i in 0..4 {
            assert!(tx.enqueue(i));
        }
        assert_eq!(tx.metrics().producer_refreshes, 0);

        // Full against the cache; refresh confirms it.
        assert!(!tx.enqueue(4));
        let m = tx.metrics();
        assert_eq!(m.producer_refreshes, 1);
        assert_eq!(m.full_failures, 1);

        // First dequeue refreshes and sees all four; the rest hit the cache.
        for i in 0..4 {
            assert_eq!(rx.dequeue(), Some(i));
        }
        assert_eq!(rx.metrics().consumer_refreshes, 1);

        // Empty: one more refresh, one failure.
        assert_eq!(rx.dequeue(), None);
        let m = rx.metrics();
        assert_eq!(m.consumer_refreshes, 2);
        assert_eq!(m.empty_failures, 1);

        // Producer refreshes once, then fills the whole ring from the cache.
        for i in 0..4 {
            assert!(tx.enqueue(i));
        }
        assert_eq!(tx.metrics().producer_refreshes, 2);
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        let (mut tx, mut rx) = CachedCursorBuffer::<u8>::new(2).unwrap().split();
        assert_eq!(rx.dequeue(), None);
        assert!(tx.enqueue(1));
        let m = tx.metrics();
        assert_eq!(m.enqueued, 1);
        assert_eq!(m.consumer_refreshes, 0);
        assert_eq!(m.empty_failures, 0);
    }

    #[test]
    fn test_cached_cross_thread_fifo() {
        const N: u64 = 100_000;
        let (mut tx, mut rx) = CachedCursorBuffer::<u64>::new(256).unwrap().split();

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
        assert_eq!(rx.dequeue(), None);
    }

    #[cfg(all(feature = "huge-pages", target_os = "linux"))]
    #[test]
    fn test_huge_page_buffer() {
        let (mut tx, mut rx) = HugePageBuffer::<u64>::with_storage(Config::from(1024))
            .unwrap()
            .split();
        for round in 0..3 {
            for i in 0..1024 {
                assert!(tx.enqueue(round * 1024 + i));
            }
            assert!(!tx.enqueue(0));
            for i in 0..1024 {
                assert_eq!(rx.dequeue(), Some(round * 1024 + i));
            }
        }
        assert_eq!(rx.ring().storage().capacity(), 1024);
    }
}
