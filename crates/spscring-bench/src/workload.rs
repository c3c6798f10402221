//! The two measured workloads.
//!
//! - single-thread: `rounds` x (`batch` enqueues, then `batch` dequeues)
//! - two-thread: a producer thread streams `rounds * batch` items to a
//!   consumer thread
//!
//! Both count an enqueue and a dequeue per item as two operations.

use crate::affinity::pin_or_warn;
use crate::cli::{Mode, Variant};
use crate::report::RunResult;
use anyhow::{anyhow, bail, ensure, Result};
use crate::baseline::StdQueue;
use spscring::{
    split, Backoff, BoundedBuffer, CachedCursorBuffer, Config, Dequeue, Enqueue, Indexing,
    LockFreeBuffer, LockedBuffer, MetricsSnapshot, RetryPolicy, SharedRing,
};
use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Workload parameters shared by every variant.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub batch: usize,
    pub rounds: usize,
    pub retry: RetryPolicy,
    /// Producer and consumer cores.
    pub pin: Option<(usize, usize)>,
    pub verify: bool,
}

impl Params {
    /// Items moved through the ring.
    pub fn items(&self) -> u64 {
        self.batch as u64 * self.rounds as u64
    }

    /// Operations counted (one enqueue plus one dequeue per item).
    pub fn ops(&self) -> u64 {
        self.items() * 2
    }
}

/// Builds the ring for `variant` and runs the `mode` workload on it.
pub fn run(variant: Variant, mode: Mode, config: Config, params: &Params) -> Result<RunResult> {
    debug!(%variant, %mode, capacity = config.capacity, "starting run");
    let (elapsed, metrics) = match variant {
        _ if variant.is_single_threaded() && mode != Mode::Single => {
            bail!("the {variant} variant only runs single-threaded")
        }
        Variant::StdQueue => {
            let mut queue = StdQueue::with_capacity(config.capacity);
            let elapsed = single_thread_owned(&mut queue, params)?;
            (elapsed, queue.metrics())
        }
        Variant::Sequential => single_thread_sequential(config, Indexing::Modulo, params)?,
        Variant::SequentialMask => single_thread_sequential(config, Indexing::Mask, params)?,
        Variant::Locked => dispatch(LockedBuffer::with_config(config)?, mode, params)?,
        Variant::LockFree => dispatch(LockFreeBuffer::with_config(config)?, mode, params)?,
        Variant::Cached => dispatch(CachedCursorBuffer::with_config(config)?, mode, params)?,
        #[cfg(target_os = "linux")]
        Variant::HugePage => dispatch(spscring::HugePageBuffer::with_storage(config)?, mode, params)?,
        #[cfg(not(target_os = "linux"))]
        Variant::HugePage => bail!("huge-page storage requires Linux"),
    };

    let result = RunResult {
        variant,
        mode,
        ops: params.ops(),
        elapsed,
    };
    if config.enable_metrics {
        info!(
            %variant,
            %mode,
            producer_refreshes = metrics.producer_refreshes,
            consumer_refreshes = metrics.consumer_refreshes,
            full_failures = metrics.full_failures,
            empty_failures = metrics.empty_failures,
            "ring counters"
        );
    }
    info!(%variant, %mode, ops_per_ms = result.ops_per_ms(), "run complete");
    Ok(result)
}

fn dispatch<R>(ring: R, mode: Mode, params: &Params) -> Result<(Duration, MetricsSnapshot)>
where
    R: SharedRing<Item = u64> + 'static,
{
    match mode {
        Mode::Single => single_thread(ring, params),
        Mode::Two => two_threads(ring, params),
        Mode::Both => bail!("`both` must be expanded before dispatch"),
    }
}

fn check_batch_fits(batch: usize, capacity: usize) -> Result<()> {
    ensure!(
        batch <= capacity,
        "batch {batch} exceeds capacity {capacity} in single-thread mode"
    );
    Ok(())
}

/// Single-thread workload on the unsynchronized ring.
pub fn single_thread_sequential(
    config: Config,
    indexing: Indexing,
    params: &Params,
) -> Result<(Duration, MetricsSnapshot)> {
    let mut buf = BoundedBuffer::<u64>::with_indexing(config, indexing)?;
    let elapsed = single_thread_owned(&mut buf, params)?;
    Ok((elapsed, buf.metrics()))
}

/// Single-thread workload on a queue that owns both ends.
pub fn single_thread_owned<Q>(queue: &mut Q, params: &Params) -> Result<Duration>
where
    Q: Enqueue<u64> + Dequeue<u64>,
{
    check_batch_fits(params.batch, queue.capacity())?;

    let start = Instant::now();
    let mut next = 0u64;
    let mut expected = 0u64;
    for _ in 0..params.rounds {
        for _ in 0..params.batch {
            queue.enqueue(next);
            next += 1;
        }
        for _ in 0..params.batch {
            let v = queue.dequeue();
            if params.verify {
                ensure!(v == Some(expected), "expected {expected}, got {v:?}");
                expected += 1;
            }
            black_box(v);
        }
    }
    Ok(start.elapsed())
}

/// Single-thread workload through the producer/consumer handles.
pub fn single_thread<R: SharedRing<Item = u64>>(
    ring: R,
    params: &Params,
) -> Result<(Duration, MetricsSnapshot)> {
    check_batch_fits(params.batch, ring.capacity())?;
    let (mut tx, mut rx) = split(ring);

    let start = Instant::now();
    let mut next = 0u64;
    let mut expected = 0u64;
    for _ in 0..params.rounds {
        for _ in 0..params.batch {
            tx.enqueue(next);
            next += 1;
        }
        for _ in 0..params.batch {
            let v = rx.dequeue();
            if params.verify {
                ensure!(v == Some(expected), "expected {expected}, got {v:?}");
                expected += 1;
            }
            black_box(v);
        }
    }
    Ok((start.elapsed(), rx.metrics()))
}

/// Two-thread workload: producer and consumer each retry per `params.retry`.
pub fn two_threads<R>(ring: R, params: &Params) -> Result<(Duration, MetricsSnapshot)>
where
    R: SharedRing<Item = u64> + 'static,
{
    let (mut tx, mut rx) = split(ring);
    let items = params.items();
    let retry = params.retry;
    let verify = params.verify;
    let (producer_core, consumer_core) = match params.pin {
        Some((p, c)) => (Some(p), Some(c)),
        None => (None, None),
    };

    let start = Instant::now();

    let producer = thread::spawn(move || {
        pin_or_warn(producer_core, "producer");
        let mut backoff = Backoff::new();
        for i in 0..items {
            while !tx.enqueue(i) {
                retry.pause(&mut backoff);
            }
            backoff.reset();
        }
    });

    let consumer = thread::spawn(move || {
        pin_or_warn(consumer_core, "consumer");
        let mut backoff = Backoff::new();
        // Keep draining after a mismatch so the producer can finish.
        let mut mismatch = None;
        for expected in 0..items {
            let v = loop {
                match rx.dequeue() {
                    Some(v) => break v,
                    None => retry.pause(&mut backoff),
                }
            };
            backoff.reset();
            if verify && v != expected && mismatch.is_none() {
                mismatch = Some((expected, v));
            }
            black_box(v);
        }
        (mismatch, rx.metrics())
    });

    producer
        .join()
        .map_err(|_| anyhow!("producer thread panicked"))?;
    let (mismatch, metrics) = consumer
        .join()
        .map_err(|_| anyhow!("consumer thread panicked"))?;
    let elapsed = start.elapsed();

    if let Some((expected, got)) = mismatch {
        bail!("order violation: expected {expected}, got {got}");
    }
    ensure!(
        metrics.dequeued == items,
        "consumer saw {} items, producer sent {items}",
        metrics.dequeued
    );
    Ok((elapsed, metrics))
}
