use crate::error::{Result, RingError};

/// How a logical cursor position is mapped onto a storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexing {
    /// `position % capacity`; any positive capacity.
    Modulo,
    /// `position & (capacity - 1)`; capacity must be a power of two.
    Mask,
}

/// Configuration shared by all ring buffer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of slots, fixed for the lifetime of the buffer.
    pub capacity: usize,
    /// Count cache refreshes and full/empty failures (cold path only)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            enable_metrics,
        }
    }

    /// Creates a configuration with `1 << bits` slots.
    pub const fn from_bits(bits: u8) -> Self {
        Self::new(1 << bits, false)
    }

    /// Enables or disables metrics collection.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Checks the capacity against the requirements of `indexing`.
    pub fn validate(&self, indexing: Indexing) -> Result<()> {
        if self.capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        if indexing == Indexing::Mask && !self.capacity.is_power_of_two() {
            return Err(RingError::NotPowerOfTwo {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Returns the mask for index wrapping.
    ///
    /// Only meaningful for a validated power-of-two capacity.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity.wrapping_sub(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        HIGH_THROUGHPUT_CONFIG
    }
}

impl From<usize> for Config {
    fn from(capacity: usize) -> Self {
        Self::new(capacity, false)
    }
}

/// Low latency configuration (4K slots, fits in L1 cache for `u32`)
pub const LOW_LATENCY_CONFIG: Config = Config::from_bits(12);

/// High throughput configuration (2M slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::from_bits(21);
