//! spscring - Bounded Single-Producer Single-Consumer Ring Buffers
//!
//! Four implementations of the same bounded FIFO contract, from a plain
//! array to a lock-free ring that rarely touches the other core's cache line:
//!
//! | Type | Threads | Synchronization |
//! |------|---------|-----------------|
//! | [`BoundedBuffer`] | one | none (modulo indexing, any capacity) |
//! | [`LockedBuffer`] | two | one `parking_lot` mutex |
//! | [`LockFreeBuffer`] | two | Acquire/Release cursors |
//! | [`CachedCursorBuffer`] | two | Acquire/Release cursors + private cached copies |
//!
//! # Key Features
//!
//! - Monotonic `u64` cursors, power-of-two capacity, mask indexing
//! - Cache-line padded cursors (no false sharing between producer and consumer)
//! - Cursor refresh only when the cached view says full/empty
//! - Pluggable slot [`Storage`]: heap by default, huge pages on Linux
//! - [`Producer`]/[`Consumer`] handles that enforce one thread per side
//!
//! # Example
//!
//! ```
//! use spscring::{CachedCursorBuffer, SharedRing};
//! use std::thread;
//!
//! let (mut tx, mut rx) = CachedCursorBuffer::<u64>::new(1024)?.split();
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..10_000 {
//!         while !tx.enqueue(i) {
//!             thread::yield_now();
//!         }
//!     }
//! });
//!
//! let mut expected = 0;
//! while expected < 10_000 {
//!     match rx.dequeue() {
//!         Some(v) => {
//!             assert_eq!(v, expected);
//!             expected += 1;
//!         }
//!         None => thread::yield_now(),
//!     }
//! }
//! producer.join().unwrap();
//! # Ok::<(), spscring::RingError>(())
//! ```

mod backoff;
mod cached;
mod config;
mod error;
mod handle;
#[cfg(all(feature = "huge-pages", target_os = "linux"))]
mod huge_pages;
mod invariants;
mod locked;
mod lockfree;
mod metrics;
mod queue;
mod sequential;
mod storage;

pub use backoff::{Backoff, RetryPolicy};
pub use cached::CachedCursorBuffer;
#[cfg(all(feature = "huge-pages", target_os = "linux"))]
pub use cached::HugePageBuffer;
pub use config::{Config, Indexing, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::{Result, RingError};
pub use handle::{split, Consumer, Producer, SharedRing};
#[cfg(all(feature = "huge-pages", target_os = "linux"))]
pub use huge_pages::{huge_page_size, HugePagePolicy, HugePageStorage, DEFAULT_HUGE_PAGE_SIZE};
pub use locked::LockedBuffer;
pub use lockfree::LockFreeBuffer;
pub use metrics::MetricsSnapshot;
pub use queue::{Dequeue, Enqueue};
pub use sequential::BoundedBuffer;
pub use storage::{HeapStorage, Storage};
