use crate::config::{Config, Indexing};
use crate::error::Result;
use crate::metrics::MetricsSnapshot;
use crate::queue::{Dequeue, Enqueue};
use crate::storage::check_layout;
use std::fmt;
use std::mem::MaybeUninit;

/// Array-backed bounded FIFO for single-threaded use.
///
/// The performance floor and the reference behaviour: every concurrent
/// variant must produce the same success/failure sequence and the same values
/// for the same sequence of operations.
pub struct BoundedBuffer<T> {
    slots: Box<[MaybeUninit<T>]>,
    write_cursor: u64,
    read_cursor: u64,
    indexing: Indexing,
    mask: u64,
    enable_metrics: bool,
    full_failures: u64,
    empty_failures: u64,
}

impl<T: Copy> BoundedBuffer<T> {
    /// Creates a modulo-indexed buffer; any positive capacity is accepted.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_indexing(Config::from(capacity), Indexing::Modulo)
    }

    /// Creates a buffer with an explicit slot-indexing scheme.
    pub fn with_indexing(config: Config, indexing: Indexing) -> Result<Self> {
        config.validate(indexing)?;
        check_layout::<T>(config.capacity)?;
        Ok(Self {
            slots: vec![MaybeUninit::uninit(); config.capacity].into_boxed_slice(),
            write_cursor: 0,
            read_cursor: 0,
            indexing,
            mask: config.mask() as u64,
            enable_metrics: config.enable_metrics,
            full_failures: 0,
            empty_failures: 0,
        })
    }

    /// Returns the buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of stored items.
    #[inline]
    pub fn len(&self) -> usize {
        (self.write_cursor - self.read_cursor) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.write_cursor == self.read_cursor
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    #[inline]
    fn slot_index(&self, pos: u64) -> usize {
        match self.indexing {
            Indexing::Modulo => (pos % self.slots.len() as u64) as usize,
            Indexing::Mask => (pos & self.mask) as usize,
        }
    }

    /// Stores `item` at the tail, or returns `false` when full.
    #[inline]
    pub fn enqueue(&mut self, item: T) -> bool {
        if self.len() == self.capacity() {
            if self.enable_metrics {
                self.full_failures += 1;
            }
            return false;
        }
        let idx = self.slot_index(self.write_cursor);
        self.slots[idx] = MaybeUninit::new(item);
        self.write_cursor += 1;
        true
    }

    /// Removes the head item, or returns `None` when empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            if self.enable_metrics {
                self.empty_failures += 1;
            }
            return None;
        }
        let idx = self.slot_index(self.read_cursor);
        // SAFETY: positions in [read_cursor, write_cursor) were written by
        // enqueue and not yet consumed.
        let item = unsafe { self.slots[idx].assume_init() };
        self.read_cursor += 1;
        Some(item)
    }

    /// Get a snapshot of the cursors and failure counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.write_cursor,
            dequeued: self.read_cursor,
            full_failures: self.full_failures,
            empty_failures: self.empty_failures,
            ..MetricsSnapshot::default()
        }
    }
}

impl<T: Copy> Enqueue<T> for BoundedBuffer<T> {
    #[inline]
    fn enqueue(&mut self, item: T) -> bool {
        BoundedBuffer::enqueue(self, item)
    }

    #[inline]
    fn capacity(&self) -> usize {
        BoundedBuffer::capacity(self)
    }
}

impl<T: Copy> Dequeue<T> for BoundedBuffer<T> {
    #[inline]
    fn dequeue(&mut self) -> Option<T> {
        BoundedBuffer::dequeue(self)
    }
}

impl<T> fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.slots.len())
            .field("write_cursor", &self.write_cursor)
            .field("read_cursor", &self.read_cursor)
            .field("indexing", &self.indexing)
            .finish_non_exhaustive()
    }
}
