use crate::config::{Config, Indexing};
use crate::error::Result;
use crate::handle::SharedRing;
use crate::metrics::MetricsSnapshot;
use crate::sequential::BoundedBuffer;
use parking_lot::Mutex;
use std::fmt;

/// Mask-indexed bounded FIFO serialized by a single mutex.
///
/// Producer and consumer contend on the same lock for every operation; this
/// is the baseline that shows what the lock-free variants save.
pub struct LockedBuffer<T> {
    inner: Mutex<BoundedBuffer<T>>,
    capacity: usize,
}

impl<T: Copy> LockedBuffer<T> {
    /// Creates a buffer with `capacity` slots (power of two).
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::from(capacity))
    }

    /// Creates a buffer from a full configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let inner = BoundedBuffer::with_indexing(config, Indexing::Mask)?;
        tracing::debug!(capacity = config.capacity, "created locked ring buffer");
        Ok(Self {
            inner: Mutex::new(inner),
            capacity: config.capacity,
        })
    }

    /// Returns the buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores `item` under the lock, or returns `false` when full.
    #[inline]
    pub fn enqueue(&self, item: T) -> bool {
        self.inner.lock().enqueue(item)
    }

    /// Removes the head item under the lock, or returns `None` when empty.
    #[inline]
    pub fn dequeue(&self) -> Option<T> {
        self.inner.lock().dequeue()
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock().is_full()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.lock().metrics()
    }
}

// Safety: every access to the slots happens under the mutex.
unsafe impl<T: Copy + Send> SharedRing for LockedBuffer<T> {
    type Item = T;

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn len(&self) -> usize {
        LockedBuffer::len(self)
    }

    fn metrics(&self) -> MetricsSnapshot {
        LockedBuffer::metrics(self)
    }

    #[inline]
    unsafe fn enqueue_unchecked(&self, item: T) -> bool {
        self.enqueue(item)
    }

    #[inline]
    unsafe fn dequeue_unchecked(&self) -> Option<T> {
        self.dequeue()
    }
}

impl<T> fmt::Debug for LockedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedBuffer")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
