//! A growable, heap-backed array with explicit length/capacity bookkeeping.
//!
//! [`Buffer`] keeps three pieces of metadata next to its storage: the number
//! of used slots (`len`), the number of reserved slots (`capacity`) and the
//! size of one element. Growth doubles the capacity until the request fits,
//! and every allocation goes through [`Vec::try_reserve_exact`] so running out
//! of memory is reported as a [`BufferError`] instead of aborting.
//!
//! Popping or clearing only moves `len`; the slots above it keep their last
//! value until overwritten and stay readable through [`Buffer::slot`].
//!
//! # Examples
//!
//! ```rust
//! use waxcsv::Buffer;
//!
//! let mut nums = Buffer::<i32>::new(2)?;
//! for i in 0..20 {
//!     nums.push(i)?;
//! }
//! assert_eq!(nums.len(), 20);
//! assert_eq!(nums[19], 19);
//! assert_eq!(nums.capacity(), 32);
//!
//! while !nums.is_empty() {
//!     nums.pop(-1);
//! }
//! assert_eq!(nums.pop(-1), -1);
//!
//! nums.free();
//! nums.free(); // no double free
//! assert!(!nums.is_allocated());
//! # Ok::<(), waxcsv::BufferError>(())
//! ```
use alloc::vec::Vec;
use core::{
    mem,
    ops::{Deref, DerefMut},
};

use crate::error::BufferError;

/// Generic owned growable array.
///
/// The `Default` value is the unallocated buffer, the same state a buffer
/// is left in by [`Buffer::free`]. Two buffers are equal when their used
/// slots are; capacity and tombstones are not compared.
#[derive(Debug)]
pub struct Buffer<T> {
    /// `None` while unallocated. Otherwise holds every slot ever written;
    /// its own length is the high-water mark and never exceeds `cap`.
    storage: Option<Vec<T>>,
    len: usize,
    cap: usize,
}

impl<T: Clone> Clone for Buffer<T> {
    /// Copies the written slots into storage of the same capacity. Aborts on
    /// allocation failure like any other `Clone`; see
    /// [`try_clone`](Buffer::try_clone).
    fn clone(&self) -> Self {
        let storage = self.storage.as_ref().map(|s| {
            let mut copy = Vec::with_capacity(self.cap);
            copy.extend_from_slice(s);
            copy
        });
        Self {
            storage,
            len: self.len,
            cap: self.cap,
        }
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Buffer<T> {}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::unallocated()
    }
}

impl<T> Buffer<T> {
    /// The "not allocated" sentinel state.
    #[must_use]
    pub const fn unallocated() -> Self {
        Self {
            storage: None,
            len: 0,
            cap: 0,
        }
    }

    /// Reserves storage for at least `initial` elements.
    ///
    /// Element storage is not initialized; slots only become readable once
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Allocation`] when the allocator refuses the
    /// request.
    pub fn new(initial: usize) -> Result<Self, BufferError> {
        let mut storage = Vec::new();
        storage.try_reserve_exact(initial)?;
        Ok(Self {
            storage: Some(storage),
            len: 0,
            cap: initial,
        })
    }

    /// Number of used slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot is in use.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of reserved slots. Zero once freed.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Bytes per element, fixed by `T`.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        mem::size_of::<T>()
    }

    /// Whether the buffer currently owns storage.
    #[inline]
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.storage.is_some()
    }

    /// Appends `value` after the last used slot.
    ///
    /// # Errors
    ///
    /// Fails when growing is needed and cannot be done. The buffer is left
    /// exactly as it was.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), BufferError> {
        if self.len == self.cap || self.storage.is_none() {
            self.reserve(1)?;
        }
        let len = self.len;
        let storage = self.storage.get_or_insert_with(Vec::new);
        if len < storage.len() {
            storage[len] = value;
        } else {
            storage.push(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Ensures at least `additional` more elements fit without reallocating.
    ///
    /// Does nothing when they already fit. Otherwise the capacity doubles,
    /// starting from `max(capacity, 1)`, until it covers `len + additional`.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityOverflow`] when the new capacity is not
    /// representable, [`BufferError::Allocation`] when the allocator fails.
    /// On error the buffer is unchanged.
    pub fn reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(BufferError::CapacityOverflow {
                len: self.len,
                additional,
            })?;
        if self.storage.is_some() && required <= self.cap {
            return Ok(());
        }

        let mut new_cap = self.cap.max(1);
        while new_cap < required {
            new_cap = new_cap
                .checked_mul(2)
                .ok_or(BufferError::CapacityOverflow {
                    len: self.len,
                    additional,
                })?;
        }

        if let Some(storage) = self.storage.as_mut() {
            let written = storage.len();
            storage.try_reserve_exact(new_cap - written)?;
        } else {
            let mut storage = Vec::new();
            storage.try_reserve_exact(new_cap)?;
            self.storage = Some(storage);
        }
        self.cap = new_cap;
        Ok(())
    }

    /// Sets the length to zero. Capacity and storage are kept for reuse;
    /// the buffer must still be freed eventually.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Releases all storage and returns to the unallocated state. Freeing an
    /// unallocated buffer is a no-op.
    pub fn free(&mut self) {
        if self.storage.take().is_some() {
            self.len = 0;
            self.cap = 0;
        }
    }

    /// Reads any slot below the capacity that has ever been written,
    /// including tombstones left by [`pop`](Self::pop) and
    /// [`clear`](Self::clear).
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&T> {
        self.storage.as_ref().and_then(|s| s.get(index))
    }

    /// Mutable counterpart of [`slot`](Self::slot).
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut T> {
        self.storage.as_mut().and_then(|s| s.get_mut(index))
    }

    /// The used slots.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Some(s) => &s[..self.len],
            None => &[],
        }
    }

    /// The used slots, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.storage {
            Some(s) => &mut s[..self.len],
            None => &mut [],
        }
    }

    /// Whether the bookkeeping agrees with the storage.
    #[cfg(any(test, feature = "fuzzing"))]
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        match &self.storage {
            Some(s) => self.len <= s.len() && s.len() <= self.cap && self.cap <= s.capacity(),
            None => self.len == 0 && self.cap == 0,
        }
    }
}

impl<T: Clone> Buffer<T> {
    /// Fallible [`Clone`]: the copy reserves the same capacity.
    ///
    /// # Errors
    ///
    /// [`BufferError::Allocation`] when the allocator refuses the request.
    pub fn try_clone(&self) -> Result<Self, BufferError> {
        let storage = match &self.storage {
            Some(s) => {
                let mut copy = Vec::new();
                copy.try_reserve_exact(self.cap)?;
                copy.extend_from_slice(s);
                Some(copy)
            }
            None => None,
        };
        Ok(Self {
            storage,
            len: self.len,
            cap: self.cap,
        })
    }

    /// Removes the last used slot and returns its value, or `default` when
    /// the buffer is empty.
    ///
    /// The slot keeps its value as a tombstone.
    pub fn pop(&mut self, default: T) -> T {
        if self.len == 0 {
            return default;
        }
        self.len -= 1;
        match self.slot(self.len) {
            Some(v) => v.clone(),
            None => default,
        }
    }
}

impl<T: Copy> Buffer<T> {
    /// Appends every element of `values`, growing once for the whole slice.
    ///
    /// # Errors
    ///
    /// Same as [`reserve`](Self::reserve); nothing is appended on failure.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<(), BufferError> {
        self.reserve(values.len())?;
        for &v in values {
            self.push(v)?;
        }
        Ok(())
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Buffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for Buffer<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> IntoIterator for &'a Buffer<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}
