//! Deterministic capacity-4 check run before any measurement.

use crate::cli::Variant;
use anyhow::{ensure, Context, Result};
use crate::baseline::StdQueue;
use spscring::{
    BoundedBuffer, CachedCursorBuffer, Config, Dequeue, Enqueue, Indexing, LockFreeBuffer,
    LockedBuffer, SharedRing,
};
use std::cell::RefCell;
use tracing::debug;

/// Empty dequeue, four enqueues, a rejected fifth, four ordered dequeues,
/// then empty again.
fn scenario(
    mut enqueue: impl FnMut(i32) -> bool,
    mut dequeue: impl FnMut() -> Option<i32>,
) -> Result<()> {
    ensure!(dequeue().is_none(), "fresh buffer is not empty");
    for i in 1..=4 {
        ensure!(enqueue(i), "enqueue {i} rejected below capacity");
    }
    ensure!(!enqueue(5), "enqueue accepted beyond capacity");
    for i in 1..=4 {
        let got = dequeue();
        ensure!(got == Some(i), "expected {i}, got {got:?}");
    }
    ensure!(dequeue().is_none(), "drained buffer is not empty");
    Ok(())
}

/// Runs the scenario against one variant.
pub fn check(variant: Variant) -> Result<()> {
    let outcome = match variant {
        // One value plays both roles for the single-threaded queues.
        Variant::StdQueue => {
            let queue = RefCell::new(StdQueue::<i32>::with_capacity(4));
            scenario(|v| queue.borrow_mut().enqueue(v), || queue.borrow_mut().dequeue())
        }
        Variant::Sequential => {
            let buf = RefCell::new(BoundedBuffer::<i32>::new(4)?);
            scenario(|v| buf.borrow_mut().enqueue(v), || buf.borrow_mut().dequeue())
        }
        Variant::SequentialMask => {
            let buf = RefCell::new(BoundedBuffer::<i32>::with_indexing(
                Config::from(4),
                Indexing::Mask,
            )?);
            scenario(|v| buf.borrow_mut().enqueue(v), || buf.borrow_mut().dequeue())
        }
        Variant::Locked => {
            let (mut tx, mut rx) = LockedBuffer::<i32>::new(4)?.split();
            scenario(|v| tx.enqueue(v), || rx.dequeue())
        }
        Variant::LockFree => {
            let (mut tx, mut rx) = LockFreeBuffer::<i32>::new(4)?.split();
            scenario(|v| tx.enqueue(v), || rx.dequeue())
        }
        Variant::Cached => {
            let (mut tx, mut rx) = CachedCursorBuffer::<i32>::new(4)?.split();
            scenario(|v| tx.enqueue(v), || rx.dequeue())
        }
        #[cfg(target_os = "linux")]
        Variant::HugePage => {
            let (mut tx, mut rx) =
                spscring::HugePageBuffer::<i32>::with_storage(Config::from(4))?.split();
            scenario(|v| tx.enqueue(v), || rx.dequeue())
        }
        #[cfg(not(target_os = "linux"))]
        Variant::HugePage => Ok(()),
    };
    outcome.with_context(|| format!("{variant} failed the capacity-4 self-check"))?;
    debug!(%variant, "self-check passed");
    Ok(())
}

/// Runs the scenario against every variant in `variants`.
pub fn check_all(variants: &[Variant]) -> Result<()> {
    variants.iter().try_for_each(|&v| check(v))
}
