//! Error types for ring buffer construction and operations.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors produced by the ring buffers and their storage.
#[derive(Debug, Error)]
pub enum RingError {
    /// The buffer is at capacity; the item was not stored.
    #[error("ring buffer is full")]
    Full,

    /// The buffer holds no items.
    #[error("ring buffer is empty")]
    Empty,

    /// A capacity of zero was requested.
    #[error("capacity must be positive")]
    ZeroCapacity,

    /// Mask-indexed variants need a power-of-two capacity.
    #[error("capacity {capacity} is not a power of two")]
    NotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The requested capacity does not fit in the address space.
    #[error("capacity {capacity} overflows the storage layout")]
    CapacityOverflow {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The item type needs stricter alignment than a page boundary gives.
    #[error("item alignment {align} exceeds the {page_size}-byte page alignment")]
    Misaligned {
        /// `align_of` the item type.
        align: usize,
        /// Alignment the mapping guarantees.
        page_size: usize,
    },

    /// A pre-allocated storage region has fewer slots than the configuration.
    #[error("storage holds {available} slots, {required} required")]
    StorageTooSmall {
        /// Slots required by the configuration.
        required: usize,
        /// Slots the storage provides.
        available: usize,
    },

    /// The OS refused a `MAP_HUGETLB` mapping.
    #[error("huge pages unavailable: {source}")]
    HugePagesUnavailable {
        /// The underlying `mmap` failure.
        #[source]
        source: io::Error,
    },

    /// Mapping the storage region failed.
    #[error("failed to map {bytes} bytes of storage: {source}")]
    Map {
        /// Size of the attempted mapping.
        bytes: usize,
        /// The underlying `mmap` failure.
        #[source]
        source: io::Error,
    },
}

impl RingError {
    /// Returns `true` for the routine producer/consumer rate-mismatch
    /// conditions (`Full`, `Empty`).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full | Self::Empty)
    }

    /// Returns `true` for errors raised while constructing a buffer.
    #[inline]
    pub fn is_construction(&self) -> bool {
        !self.is_recoverable()
    }
}
