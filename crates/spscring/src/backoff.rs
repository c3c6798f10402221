//! Waiting on a full or empty ring.
//!
//! The buffers never block: `enqueue` returns `false` and `dequeue` returns
//! `None`. Callers that want to wait pick a [`RetryPolicy`]; the adaptive
//! policy and the two-thread harness loops keep their escalation state in a
//! [`Backoff`].

use std::hint;
use std::thread;
use std::time::Duration;

/// Escalating wait for a side polling the other side's cursor.
///
/// The first calls spin with PAUSE hints, doubling each time, which covers a
/// peer that is a few operations behind. After that [`snooze`](Self::snooze)
/// yields the core, so a producer and consumer sharing one CPU still make
/// progress. [`is_completed`](Self::is_completed) tells a bounded retry loop
/// to stop.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    /// Steps that spin; step `n` issues `2^n` PAUSE hints.
    const SPIN_LIMIT: u32 = 6;
    /// Steps after which a bounded wait gives up.
    const YIELD_LIMIT: u32 = 10;

    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Busy-waits `2^step` PAUSE hints, growing up to `2^SPIN_LIMIT`.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(Self::SPIN_LIMIT) {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Spins while the spin budget lasts, then yields to the scheduler.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step > Self::SPIN_LIMIT {
            thread::yield_now();
            if self.step <= Self::YIELD_LIMIT {
                self.step += 1;
            }
        } else {
            self.spin();
        }
    }

    /// `true` once spinning and yielding have both run their course.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Starts over after a successful operation.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-side policy for retrying a failed `enqueue`/`dequeue`.
///
/// The ring operations themselves never wait; this is layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Single attempt, report failure immediately.
    #[default]
    Immediate,
    /// Up to `n` extra attempts separated by a PAUSE hint.
    Spin(u32),
    /// [`Backoff`]: spin, then yield, then give up.
    Adaptive,
    /// Up to `attempts` extra attempts, sleeping `interval` before each.
    Sleep { interval: Duration, attempts: u32 },
}

impl RetryPolicy {
    /// One-millisecond courtesy sleep between polls, retried indefinitely by
    /// callers that use [`pause`](Self::pause) in their own loop.
    pub const COURTESY_SLEEP: Self = Self::Sleep {
        interval: Duration::from_millis(1),
        attempts: 1,
    };

    /// Runs `op` until it returns `Some`, waiting between attempts.
    ///
    /// Returns `None` once the policy's patience is exhausted.
    pub fn retry<R>(&self, mut op: impl FnMut() -> Option<R>) -> Option<R> {
        if let Some(value) = op() {
            return Some(value);
        }
        match *self {
            Self::Immediate => None,
            Self::Spin(extra) => (0..extra).find_map(|_| {
                hint::spin_loop();
                op()
            }),
            Self::Adaptive => {
                let mut backoff = Backoff::new();
                while !backoff.is_completed() {
                    backoff.snooze();
                    if let Some(value) = op() {
                        return Some(value);
                    }
                }
                None
            }
            Self::Sleep { interval, attempts } => (0..attempts).find_map(|_| {
                thread::sleep(interval);
                op()
            }),
        }
    }

    /// Waits once between attempts of a caller-driven loop that never gives up.
    ///
    /// `backoff` carries state across calls for [`RetryPolicy::Adaptive`];
    /// reset it after a successful attempt.
    #[inline]
    pub fn pause(&self, backoff: &mut Backoff) {
        match *self {
            Self::Immediate | Self::Spin(_) => hint::spin_loop(),
            Self::Adaptive if backoff.is_completed() => thread::yield_now(),
            Self::Adaptive => backoff.snooze(),
            Self::Sleep { interval, .. } => thread::sleep(interval),
        }
    }
}
