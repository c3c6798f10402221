//! Standard-library queue measured alongside the ring buffers.

use spscring::{Dequeue, Enqueue, MetricsSnapshot};
use std::collections::VecDeque;

/// `VecDeque` with the same bounded contract as the rings: an enqueue at
/// capacity is refused instead of growing the queue.
#[derive(Debug)]
pub struct StdQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    enqueued: u64,
    dequeued: u64,
    full_failures: u64,
    empty_failures: u64,
}

impl<T> StdQueue<T> {
    /// Preallocates `capacity` slots so the measured loop never reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            enqueued: 0,
            dequeued: 0,
            full_failures: 0,
            empty_failures: 0,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued,
            dequeued: self.dequeued,
            full_failures: self.full_failures,
            empty_failures: self.empty_failures,
            ..MetricsSnapshot::default()
        }
    }
}

impl<T: Copy> Enqueue<T> for StdQueue<T> {
    #[inline]
    fn enqueue(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            self.full_failures += 1;
            return false;
        }
        self.items.push_back(item);
        self.enqueued += 1;
        true
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Copy> Dequeue<T> for StdQueue<T> {
    #[inline]
    fn dequeue(&mut self) -> Option<T> {
        let item = self.items.pop_front();
        match item {
            Some(_) => self.dequeued += 1,
            None => self.empty_failures += 1,
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_grow_past_capacity() {
        let mut q = StdQueue::with_capacity(2);
        assert!(q.enqueue(1u8));
        assert!(q.enqueue(2));
        assert!(!q.enqueue(3));
        assert_eq!(q.dequeue(), Some(1));
        assert!(q.enqueue(3));
        assert_eq!(q.dequeue(), Some(2));
        assert_eq!(q.dequeue(), Some(3));
        assert_eq!(q.dequeue(), None);

        let m = q.metrics();
        assert_eq!((m.enqueued, m.dequeued), (3, 3));
        assert_eq!((m.full_failures, m.empty_failures), (1, 1));
    }
}
