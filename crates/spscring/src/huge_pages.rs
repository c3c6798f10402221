//! Huge-page backed ring storage (Linux).
//!
//! Large buffers under sustained throughput pay for TLB misses on every
//! page crossing. Mapping the slots with `MAP_HUGETLB` cuts the number of
//! translations by the huge-page factor (512x for 2 MiB pages).
//!
//! Huge pages must be reserved by the administrator
//! (`/proc/sys/vm/nr_hugepages`). With [`HugePagePolicy::Preferred`] a failed
//! reservation falls back to an ordinary anonymous mapping advised with
//! `MADV_HUGEPAGE`, so transparent huge pages can still back it.

use crate::error::{Result, RingError};
use crate::storage::{check_layout, Storage};
use std::ffi::c_void;
use std::fmt;
use std::io;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};
use tracing::{debug, error, warn};

/// Huge page size assumed when `/proc/meminfo` cannot be read.
pub const DEFAULT_HUGE_PAGE_SIZE: usize = 2 * 1024 * 1024;

/// What to do when `MAP_HUGETLB` cannot be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HugePagePolicy {
    /// Fail with [`RingError::HugePagesUnavailable`].
    Required,
    /// Fall back to a regular mapping advised for transparent huge pages.
    #[default]
    Preferred,
}

/// Ring slots in an anonymous `mmap` region, unmapped on drop.
///
/// Move-only: the mapping has exactly one owner and is released exactly once.
pub struct HugePageStorage<T> {
    ptr: NonNull<MaybeUninit<T>>,
    capacity: usize,
    mapped_len: usize,
    huge: bool,
}

// Safety: HugePageStorage owns its mapping exclusively; slot access is
// coordinated by the ring protocol.
unsafe impl<T: Send> Send for HugePageStorage<T> {}
unsafe impl<T: Send> Sync for HugePageStorage<T> {}

impl<T> HugePageStorage<T> {
    /// Maps storage for `capacity` slots according to `policy`.
    pub fn allocate_with(capacity: usize, policy: HugePagePolicy) -> Result<Self> {
        let layout = check_layout::<T>(capacity)?;
        let page_size = huge_page_size();
        check_alignment::<T>(page_size)?;

        let mapped_len = layout
            .size()
            .max(1)
            .checked_next_multiple_of(page_size)
            .ok_or(RingError::CapacityOverflow { capacity })?;

        let (base, huge) = match map_anonymous(mapped_len, libc::MAP_HUGETLB) {
            Ok(base) => (base, true),
            Err(source) if policy == HugePagePolicy::Required => {
                return Err(RingError::HugePagesUnavailable { source });
            }
            Err(source) => {
                warn!(
                    bytes = mapped_len,
                    error = %source,
                    "huge pages unavailable, falling back to transparent huge pages"
                );
                let base = map_anonymous(mapped_len, 0).map_err(|source| RingError::Map {
                    bytes: mapped_len,
                    source,
                })?;
                advise_huge(base, mapped_len);
                (base, false)
            }
        };

        debug!(capacity, bytes = mapped_len, huge, "mapped ring storage");

        Ok(Self {
            ptr: base.cast(),
            capacity,
            mapped_len,
            huge,
        })
    }

    /// Returns `true` if the region is backed by explicit huge pages.
    pub fn is_huge(&self) -> bool {
        self.huge
    }

    /// Size of the mapping in bytes (a multiple of the huge page size).
    pub fn mapped_len(&self) -> usize {
        self.mapped_len
    }
}

unsafe impl<T: Send> Storage<T> for HugePageStorage<T> {
    fn allocate(capacity: usize) -> Result<Self> {
        Self::allocate_with(capacity, HugePagePolicy::default())
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn as_ptr(&self) -> *mut MaybeUninit<T> {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for HugePageStorage<T> {
    fn drop(&mut self) {
        // SAFETY: ptr/mapped_len describe the mapping created in
        // allocate_with, and Drop runs once.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast::<c_void>(), self.mapped_len) };
        if rc != 0 {
            error!(
                bytes = self.mapped_len,
                error = %io::Error::last_os_error(),
                "munmap of ring storage failed"
            );
        }
    }
}

impl<T> fmt::Debug for HugePageStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HugePageStorage")
            .field("capacity", &self.capacity)
            .field("mapped_len", &self.mapped_len)
            .field("huge", &self.huge)
            .finish_non_exhaustive()
    }
}

/// Mappings are page aligned; `T` may not ask for more.
fn check_alignment<T>(page_size: usize) -> Result<()> {
    let align = mem::align_of::<T>();
    if align > page_size {
        return Err(RingError::Misaligned { align, page_size });
    }
    Ok(())
}

/// Default huge page size of the running kernel.
pub fn huge_page_size() -> usize {
    std::fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|meminfo| parse_huge_page_size(&meminfo))
        .unwrap_or(DEFAULT_HUGE_PAGE_SIZE)
}

fn parse_huge_page_size(meminfo: &str) -> Option<usize> {
    let line = meminfo.lines().find(|l| l.starts_with("Hugepagesize:"))?;
    let mut fields = line.split_whitespace().skip(1);
    let value: usize = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") => value.checked_mul(1024),
        _ => None,
    }
}

fn map_anonymous(len: usize, extra_flags: libc::c_int) -> io::Result<NonNull<c_void>> {
    // SAFETY: anonymous private mapping with no fd; the kernel picks the address.
    let base = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | extra_flags,
            -1,
            0,
        )
    };
    if base == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(base).ok_or_else(|| io::Error::other("mmap returned null"))
}

fn advise_huge(base: NonNull<c_void>, len: usize) {
    // SAFETY: base/len is a live mapping we own; madvise is only a hint.
    let rc = unsafe { libc::madvise(base.as_ptr(), len, libc::MADV_HUGEPAGE) };
    if rc != 0 {
        debug!(error = %io::Error::last_os_error(), "MADV_HUGEPAGE rejected");
    }
}
