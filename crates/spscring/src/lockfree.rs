use crate::config::{Config, Indexing};
use crate::error::{Result, RingError};
use crate::handle::SharedRing;
use crate::invariants::{debug_assert_bounded_count, debug_assert_read_not_past_write};
use crate::metrics::{MetricsSnapshot, SideCounters};
use crate::storage::{HeapStorage, Storage};
use crossbeam_utils::CachePadded;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Cursors are unbounded u64 counters (items ever written / read). With 2^64
// values wrap-around is practically impossible; the slot index is computed as
// `cursor & mask` only when touching storage.
//
// **Producer (enqueue):**
// 1. Load `write_cursor` with Relaxed (only the producer writes it)
// 2. Load `read_cursor` with Acquire (synchronizes with the consumer's
//    Release: the consumer is done with the slot about to be reused)
// 3. Full if `write - read == capacity`
// 4. Plain write into the slot
// 5. Store `write + 1` with Release (publishes the slot to the consumer)
//
// **Consumer (dequeue):**
// 1. Load `read_cursor` with Relaxed (only the consumer writes it)
// 2. Load `write_cursor` with Acquire (synchronizes with the producer's
//    Release: the slot contents are visible)
// 3. Empty if `write == read`
// 4. Plain read from the slot
// 5. Store `read + 1` with Release (hands the slot back to the producer)
//
// Every operation pays one Acquire load of the other side's cursor, i.e. one
// potential cross-core cache-line transfer. `CachedCursorBuffer` removes it
// from the common case.
//
// =============================================================================

/// Lock-free SPSC ring buffer with atomic cursors and no cursor caching.
///
/// Each cursor sits on its own cache line so producer stores to
/// `write_cursor` never invalidate the line the consumer polls for
/// `read_cursor`, and vice versa.
#[repr(C)]
pub struct LockFreeBuffer<T, S = HeapStorage<T>> {
    // === PRODUCER HOT ===
    /// Items ever enqueued (written by producer, read by consumer)
    write_cursor: CachePadded<AtomicU64>,
    producer_counters: CachePadded<SideCounters>,

    // === CONSUMER HOT ===
    /// Items ever dequeued (written by consumer, read by producer)
    read_cursor: CachePadded<AtomicU64>,
    consumer_counters: CachePadded<SideCounters>,

    // === COLD STATE ===
    config: Config,
    mask: u64,
    storage: S,
    _marker: PhantomData<T>,
}

// Safety: items are moved between threads (T: Send) and each slot is touched
// by at most one side at a time, as established by the cursor protocol.
unsafe impl<T: Send, S: Storage<T>> Send for LockFreeBuffer<T, S> {}
unsafe impl<T: Send, S: Storage<T>> Sync for LockFreeBuffer<T, S> {}

impl<T: Copy + Send> LockFreeBuffer<T> {
    /// Creates a heap-backed buffer with `capacity` slots (power of two).
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::from(capacity))
    }

    /// Creates a heap-backed buffer from a full configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_storage(config)
    }
}

impl<T: Copy + Send, S: Storage<T>> LockFreeBuffer<T, S> {
    /// Creates a buffer whose slots come from the storage strategy `S`.
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
        tracing::debug!(capacity = config.capacity, "created lock-free ring buffer");
        Ok(Self {
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            producer_counters: CachePadded::new(SideCounters::new()),
            read_cursor: CachePadded::new(AtomicU64::new(0)),
            consumer_counters: CachePadded::new(SideCounters::new()),
            config,
            mask: config.mask() as u64,
            storage,
            _marker: PhantomData,
        })
    }

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Returns the current number of items in the ring.
    pub fn len(&self) -> usize {
        // read first: any write cursor loaded afterwards is at least as large.
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

    /// The storage strategy holding the slots.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get a snapshot of the cursors and (if enabled) failure counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        // read first, as in `len`, so `dequeued <= enqueued` in every snapshot.
        let dequeued = self.read_cursor.load(Ordering::Acquire);
        let enqueued = self.write_cursor.load(Ordering::Acquire);
        MetricsSnapshot {
            enqueued,
            dequeued,
            full_failures: self.producer_counters.failures(),
            empty_failures: self.consumer_counters.failures(),
            ..MetricsSnapshot::default()
        }
    }

    #[inline]
    fn slot(&self, pos: u64) -> *mut MaybeUninit<T> {
        let idx = (pos & self.mask) as usize;
        // SAFETY: idx < capacity <= storage.capacity().
        unsafe { self.storage.as_ptr().add(idx) }
    }
}

unsafe impl<T: Copy + Send, S: Storage<T>> SharedRing for LockFreeBuffer<T, S> {
    type Item = T;

    #[inline]
    fn capacity(&self) -> usize {
        self.config.capacity
    }

    fn len(&self) -> usize {
        LockFreeBuffer::len(self)
    }

    fn metrics(&self) -> MetricsSnapshot {
        LockFreeBuffer::metrics(self)
    }

    #[inline]
    unsafe fn enqueue_unchecked(&self, item: T) -> bool {
        let write = self.write_cursor.load(Ordering::Relaxed);
        let read = self.read_cursor.load(Ordering::Acquire);
        let capacity = self.config.capacity as u64;

        if write.wrapping_sub(read) >= capacity {
            if self.config.enable_metrics {
                self.producer_counters.record_failure();
            }
            return false;
        }

        debug_assert_bounded_count!(write.wrapping_sub(read) + 1, capacity);

        // SAFETY: the slot at `write` was last used by position
        // `write - capacity`, which the consumer has released (Acquire above).
        // Only the producer writes slots in [read + capacity, write].
        unsafe { self.slot(write).write(MaybeUninit::new(item)) };

        self.write_cursor
            .store(write.wrapping_add(1), Ordering::Release);
        true
    }

    #[inline]
    unsafe fn dequeue_unchecked(&self) -> Option<T> {
        let read = self.read_cursor.load(Ordering::Relaxed);
        let write = self.write_cursor.load(Ordering::Acquire);

        if write == read {
            if self.config.enable_metrics {
                self.consumer_counters.record_failure();
            }
            return None;
        }

        debug_assert_read_not_past_write!(read.wrapping_add(1), write);

        // SAFETY: read < write, so the producer published this slot before its
        // Release store of `write`, which the Acquire above observed. The
        // producer will not reuse it until we advance `read_cursor`.
        let item = unsafe { self.slot(read).read().assume_init() };

        self.read_cursor
            .store(read.wrapping_add(1), Ordering::Release);
        Some(item)
    }
}

impl<T, S: fmt::Debug> fmt::Debug for LockFreeBuffer<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeBuffer")
            .field("capacity", &self.config.capacity)
            .field("write_cursor", &self.write_cursor.load(Ordering::Relaxed))
            .field("read_cursor", &self.read_cursor.load(Ordering::Relaxed))
            .field("storage", &self.storage)
            .finish()
    }
}
