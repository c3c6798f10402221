//! The contract shared by every buffer variant.
//!
//! `enqueue`/`dequeue` report `Full`/`Empty` through `bool`/`Option`: under a
//! producer/consumer rate mismatch both are routine. The `try_*` helpers lift
//! them into [`RingError`] for callers that prefer `?`.

use crate::backoff::RetryPolicy;
use crate::error::{Result, RingError};

/// Producer side of a bounded FIFO.
pub trait Enqueue<T: Copy> {
    /// Stores `item` at the tail. Returns `false`, without storing, when full.
    fn enqueue(&mut self, item: T) -> bool;

    /// Number of slots.
    fn capacity(&self) -> usize;

    /// [`enqueue`](Self::enqueue) with the failure as [`RingError::Full`].
    #[inline]
    fn try_enqueue(&mut self, item: T) -> Result<()> {
        if self.enqueue(item) {
            Ok(())
        } else {
            Err(RingError::Full)
        }
    }

    /// Retries a full buffer according to `policy`.
    fn enqueue_with(&mut self, item: T, policy: &RetryPolicy) -> bool {
        policy.retry(|| self.enqueue(item).then_some(())).is_some()
    }
}

/// Consumer side of a bounded FIFO.
pub trait Dequeue<T: Copy> {
    /// Removes the head item, or `None` when empty.
    fn dequeue(&mut self) -> Option<T>;

    /// [`dequeue`](Self::dequeue) with the failure as [`RingError::Empty`].
    #[inline]
    fn try_dequeue(&mut self) -> Result<T> {
        self.dequeue().ok_or(RingError::Empty)
    }

    /// Retries an empty buffer according to `policy`.
    fn dequeue_with(&mut self, policy: &RetryPolicy) -> Option<T> {
        policy.retry(|| self.dequeue())
    }
}
