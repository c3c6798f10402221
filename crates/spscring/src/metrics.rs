use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a ring buffer's counters.
///
/// `enqueued`/`dequeued` come straight from the cursors and are always
/// populated. The remaining counters stay at zero unless the buffer was built
/// with `Config::enable_metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub dequeued: u64,
    /// Producer acquire-loads of the read cursor (cache misses).
    pub producer_refreshes: u64,
    /// Consumer acquire-loads of the write cursor (cache misses).
    pub consumer_refreshes: u64,
    pub full_failures: u64,
    pub empty_failures: u64,
}

/// Counters owned by one side of the ring.
///
/// Single writer: only the owning thread bumps them, so a relaxed
/// load/store pair is enough and avoids a locked RMW.
#[derive(Debug, Default)]
pub(crate) struct SideCounters {
    refreshes: AtomicU64,
    failures: AtomicU64,
}

impl SideCounters {
    pub(crate) const fn new() -> Self {
        Self {
            refreshes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_refresh(&self) {
        bump(&self.refreshes);
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        bump(&self.failures);
    }

    pub(crate) fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub(crate) fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[inline]
fn bump(counter: &AtomicU64) {
    counter.store(counter.load(Ordering::Relaxed) + 1, Ordering::Relaxed);
}
