use clap::{Parser, ValueEnum};
use spscring::RetryPolicy;
use std::fmt;

/// Throughput harness for the spscring buffer variants
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Ring capacity in slots (power of two for the concurrent variants)
    #[arg(short = 'c', long, env = "SPSC_CAPACITY", default_value = "2097152")]
    pub capacity: usize,

    /// Items per batch
    #[arg(short = 'b', long, env = "SPSC_BATCH", default_value = "1000")]
    pub batch: usize,

    /// Number of batches
    #[arg(short = 'r', long, env = "SPSC_ROUNDS", default_value = "500000")]
    pub rounds: usize,

    /// Variants to run, comma separated (default: all)
    #[arg(short = 'v', long = "variant", value_enum, value_delimiter = ',')]
    pub variants: Vec<Variant>,

    /// Workload shape
    #[arg(short = 'm', long, value_enum, default_value_t = Mode::Both)]
    pub mode: Mode,

    /// Core for the producer thread (two-thread mode)
    #[arg(long, default_value = "0")]
    pub producer_core: usize,

    /// Core for the consumer thread (two-thread mode)
    #[arg(long, default_value = "1")]
    pub consumer_core: usize,

    /// Leave thread placement to the scheduler
    #[arg(long)]
    pub no_pin: bool,

    /// How a side waits when the ring is full or empty
    #[arg(long, value_enum, default_value_t = Retry::Spin)]
    pub retry: Retry,

    /// Check that every item arrives in order
    #[arg(long)]
    pub verify: bool,

    /// Collect refresh and failure counters
    #[arg(long)]
    pub metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    /// Selected variants, all of them when none were named.
    pub fn variants(&self) -> Vec<Variant> {
        if self.variants.is_empty() {
            Variant::value_variants().to_vec()
        } else {
            self.variants.clone()
        }
    }

    /// Producer and consumer cores, unless pinning is disabled.
    pub fn pinning(&self) -> Option<(usize, usize)> {
        (!self.no_pin).then_some((self.producer_core, self.consumer_core))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Bounded `VecDeque`
    #[value(name = "stdqueue")]
    StdQueue,
    /// Unsynchronized ring, modulo indexing
    Sequential,
    /// Unsynchronized ring, mask indexing
    #[value(name = "sequential-mask")]
    SequentialMask,
    Locked,
    #[value(name = "lockfree")]
    LockFree,
    Cached,
    /// Cached-cursor buffer over huge pages (Linux)
    #[value(name = "hugepage")]
    HugePage,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Self::StdQueue => "stdqueue",
            Self::Sequential => "sequential",
            Self::SequentialMask => "sequential-mask",
            Self::Locked => "locked",
            Self::LockFree => "lockfree",
            Self::Cached => "cached",
            Self::HugePage => "hugepage",
        }
    }
}

impl Variant {
    /// Queues with no producer/consumer split; single-thread workload only.
    pub fn is_single_threaded(self) -> bool {
        matches!(self, Self::StdQueue | Self::Sequential | Self::SequentialMask)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Batch enqueue then batch dequeue on one thread
    Single,
    /// Producer and consumer on separate threads
    Two,
    Both,
}

impl Mode {
    /// The concrete workloads this selection expands to.
    pub fn workloads(self) -> &'static [Mode] {
        match self {
            Self::Single => &[Self::Single],
            Self::Two => &[Self::Two],
            Self::Both => &[Self::Single, Self::Two],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single-thread",
            Self::Two => "two-thread",
            Self::Both => "both",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Retry {
    /// Busy-poll with a PAUSE hint
    Spin,
    /// Spin, then yield
    Adaptive,
    /// Sleep 1 ms between attempts
    Sleep,
}

impl From<Retry> for RetryPolicy {
    fn from(retry: Retry) -> Self {
        match retry {
            Retry::Spin => RetryPolicy::Spin(0),
            Retry::Adaptive => RetryPolicy::Adaptive,
            Retry::Sleep => RetryPolicy::COURTESY_SLEEP,
        }
    }
}
