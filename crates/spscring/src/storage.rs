//! Storage strategies for the concurrent ring buffers.
//!
//! The ring logic never allocates on its own: it asks a [`Storage`]
//! implementation for `capacity` contiguous slots and keeps that value until
//! the buffer is dropped. Swapping the strategy swaps where the slots come
//! from (heap, huge pages) without touching the cursor protocol.

use crate::error::{Result, RingError};
use std::alloc::Layout;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;

/// A fixed-address, contiguous region of ring slots.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - `as_ptr()` points to `capacity()` contiguous, properly aligned slots of `T`
/// - the address never changes for the lifetime of the value
/// - the region is released exactly once, when the value is dropped
/// - writing through the pointer from `&self` is permitted (interior mutability)
pub unsafe trait Storage<T>: Send + Sync {
    /// Acquires storage for `capacity` slots.
    fn allocate(capacity: usize) -> Result<Self>
    where
        Self: Sized;

    /// Number of usable slots.
    fn capacity(&self) -> usize;

    /// Pointer to the first slot.
    fn as_ptr(&self) -> *mut MaybeUninit<T>;
}

/// Rejects zero and layout-overflowing capacities before any allocation.
pub(crate) fn check_layout<T>(capacity: usize) -> Result<Layout> {
    if capacity == 0 {
        return Err(RingError::ZeroCapacity);
    }
    Layout::array::<T>(capacity).map_err(|_| RingError::CapacityOverflow { capacity })
}

/// Ordinary heap-allocated slots (the default strategy).
///
/// Uses `Box<[_]>` instead of `Vec<_>`: the buffer is fixed at construction and
/// never grows or shrinks.
pub struct HeapStorage<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: the slots are only reached through `as_ptr()`, and the ring protocol
// guarantees no slot is accessed by two threads at once.
unsafe impl<T: Send> Send for HeapStorage<T> {}
unsafe impl<T: Send> Sync for HeapStorage<T> {}

unsafe impl<T: Send> Storage<T> for HeapStorage<T> {
    fn allocate(capacity: usize) -> Result<Self> {
        check_layout::<T>(capacity)?;
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Ok(Self { slots })
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn as_ptr(&self) -> *mut MaybeUninit<T> {
        UnsafeCell::raw_get(self.slots.as_ptr())
    }
}

impl<T> fmt::Debug for HeapStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapStorage")
            .field("capacity", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_storage_allocation() {
        let storage = HeapStorage::<u64>::allocate(16).unwrap();
        assert_eq!(storage.capacity(), 16);

        // SAFETY: index 15 is in bounds and nothing else touches the slots.
        unsafe {
            storage.as_ptr().add(15).write(MaybeUninit::new(7));
            assert_eq!(storage.as_ptr().add(15).read().assume_init(), 7);
        }
    }

    #[test]
    fn test_heap_storage_rejects_zero() {
        assert!(matches!(
            HeapStorage::<u32>::allocate(0),
            Err(RingError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_heap_storage_rejects_overflow() {
        assert!(matches!(
            HeapStorage::<u64>::allocate(usize::MAX),
            Err(RingError::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn test_heap_storage_fixed_address() {
        let storage = HeapStorage::<u32>::allocate(8).unwrap();
        let before = storage.as_ptr();
        let moved = storage;
        assert_eq!(before, moved.as_ptr());
    }
}
