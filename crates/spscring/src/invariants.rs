//! Assertion macros for the cursor invariants.
//!
//! The `debug_assert_*` macros are only active in debug builds
//! (`#[cfg(debug_assertions)]`), so there is zero overhead in release builds.
//! `assert_refresh_*` stay on in release: they sit on the cold refresh path of
//! the cached-cursor buffer, and a violation there means the protocol itself
//! is broken.
//!
//! Used by `LockFreeBuffer<T, S>` and `CachedCursorBuffer<T, S>`.

// =============================================================================
// Bounded occupancy
// =============================================================================

/// Assert that occupancy does not exceed capacity.
///
/// **Invariant**: `0 ≤ (write - read) ≤ capacity`
///
/// Used in: `enqueue` before publishing the new write cursor
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded occupancy violated: count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that the read cursor does not advance past the write cursor.
///
/// **Invariant**: `read ≤ write` (after advance)
///
/// Used in: `dequeue` before publishing the new read cursor
macro_rules! debug_assert_read_not_past_write {
    ($new_read:expr, $write:expr) => {
        debug_assert!(
            $new_read <= $write,
            "cursor order violated: advancing read {} beyond write {}",
            $new_read,
            $write
        )
    };
}

// =============================================================================
// Cached cursor refresh
// =============================================================================

/// Assert that a refreshed cursor never shows less progress than the cached
/// copy it replaces, and stays within `[lower, upper]` of the own cursor.
///
/// **Invariant**: `fresh ≥ cached` and `lower ≤ fresh ≤ upper`
///
/// Used in: cached-cursor `enqueue`/`dequeue` slow paths
macro_rules! assert_refresh_monotonic {
    ($name:literal, $cached:expr, $fresh:expr, $lower:expr, $upper:expr) => {
        assert!(
            $fresh >= $cached && $fresh >= $lower && $fresh <= $upper,
            "cached cursor refresh violated: {} moved from cached {} to {} (allowed [{}, {}])",
            $name,
            $cached,
            $fresh,
            $lower,
            $upper
        )
    };
}

pub(crate) use assert_refresh_monotonic;
pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_read_not_past_write;
