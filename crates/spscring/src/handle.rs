//! Producer/consumer handles for the concurrent variants.
//!
//! A ring is shared through an `Arc` and split into exactly one [`Producer`]
//! and one [`Consumer`]. Neither handle is `Clone`, and both operations take
//! `&mut self`, so the single-producer/single-consumer discipline the
//! lock-free protocols rely on is enforced by the type system.

use crate::metrics::MetricsSnapshot;
use crate::queue::{Dequeue, Enqueue};
use std::fmt;
use std::sync::Arc;

/// A ring buffer that can be driven by one producer thread and one consumer
/// thread concurrently.
///
/// # Safety
///
/// Implementors must be sound when one thread calls
/// [`enqueue_unchecked`](Self::enqueue_unchecked) while another thread calls
/// [`dequeue_unchecked`](Self::dequeue_unchecked), provided callers uphold the
/// per-method contracts below.
pub unsafe trait SharedRing: Send + Sync {
    /// Element type carried by the ring.
    type Item: Copy + Send;

    /// Number of slots.
    fn capacity(&self) -> usize;

    /// Number of stored items. Approximate while the other side is active.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a snapshot of the ring's counters.
    fn metrics(&self) -> MetricsSnapshot;

    /// Stores `item` at the tail, or returns `false` when full.
    ///
    /// # Safety
    ///
    /// No other thread may call `enqueue_unchecked` on this ring concurrently.
    unsafe fn enqueue_unchecked(&self, item: Self::Item) -> bool;

    /// Removes the head item, or returns `None` when empty.
    ///
    /// # Safety
    ///
    /// No other thread may call `dequeue_unchecked` on this ring concurrently.
    unsafe fn dequeue_unchecked(&self) -> Option<Self::Item>;

    /// Splits the ring into its producer and consumer halves.
    fn split(self) -> (Producer<Self>, Consumer<Self>)
    where
        Self: Sized,
    {
        split(self)
    }
}

/// Splits `ring` into its producer and consumer halves.
pub fn split<R: SharedRing>(ring: R) -> (Producer<R>, Consumer<R>) {
    let ring = Arc::new(ring);
    (
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    )
}

/// The single writing half of a [`SharedRing`].
pub struct Producer<R: SharedRing> {
    ring: Arc<R>,
}

impl<R: SharedRing> Producer<R> {
    /// Stores `item` at the tail, or returns `false` when full.
    #[inline]
    pub fn enqueue(&mut self, item: R::Item) -> bool {
        // SAFETY: this handle is the ring's only producer. It is not `Clone`,
        // and `&mut self` rules out concurrent calls through shared references.
        unsafe { self.ring.enqueue_unchecked(item) }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.len() >= self.ring.capacity()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }

    /// The shared ring, for inspection.
    pub fn ring(&self) -> &R {
        &self.ring
    }
}

/// The single reading half of a [`SharedRing`].
pub struct Consumer<R: SharedRing> {
    ring: Arc<R>,
}

impl<R: SharedRing> Consumer<R> {
    /// Removes the head item, or returns `None` when empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<R::Item> {
        // SAFETY: this handle is the ring's only consumer. It is not `Clone`,
        // and `&mut self` rules out concurrent calls through shared references.
        unsafe { self.ring.dequeue_unchecked() }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.len() >= self.ring.capacity()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }

    /// The shared ring, for inspection.
    pub fn ring(&self) -> &R {
        &self.ring
    }
}

impl<R: SharedRing> Enqueue<R::Item> for Producer<R> {
    #[inline]
    fn enqueue(&mut self, item: R::Item) -> bool {
        Producer::enqueue(self, item)
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<R: SharedRing> Dequeue<R::Item> for Consumer<R> {
    #[inline]
    fn dequeue(&mut self) -> Option<R::Item> {
        Consumer::dequeue(self)
    }
}

impl<R: SharedRing> fmt::Debug for Producer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.ring.capacity())
            .field("len", &self.ring.len())
            .finish()
    }
}

impl<R: SharedRing> fmt::Debug for Consumer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.ring.capacity())
            .field("len", &self.ring.len())
            .finish()
    }
}
