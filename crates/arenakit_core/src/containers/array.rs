//! # Arena-Backed Array
//!
//! A growable sequence whose storage is carved from an [`Arena`].
//!
//! Growth goes through [`Arena::realloc`], so an array whose buffer is still
//! the arena's latest allocation grows in place. Shrinking zeroes the dropped
//! elements regardless of the arena flags.

#![allow(unsafe_code)]

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use bytemuck::Pod;

use super::Span;
use crate::memory::Arena;

/// A growable array of plain-old-data elements living in an arena.
///
/// The array never frees its buffer; the memory is reclaimed when the arena
/// is cleared or freed, which the borrow on `'a` forbids while the array is
/// alive.
///
/// Indexing goes through the slice returned by [`Deref`] and panics when out
/// of range.
///
/// # Example
///
/// ```rust
/// use arenakit_core::{Arena, ArenaFlags, Array};
///
/// let arena = Arena::new(256, ArenaFlags::CLEAR_TO_ZERO);
/// let mut ids: Array<'_, u16> = Array::new(&arena);
///
/// for id in 1..=4 {
///     ids.push(id);
/// }
/// assert_eq!(ids.pop(), 4);
/// assert_eq!(&ids[..], &[1, 2, 3]);
/// ```
pub struct Array<'a, T: Pod> {
    arena: &'a Arena,
    /// Start of the buffer, `None` until the first reservation.
    data: Option<NonNull<T>>,
    len: usize,
    capacity: usize,
}

impl<'a, T: Pod> Array<'a, T> {
    /// Creates an empty array. Nothing is allocated until the first push or
    /// reservation.
    #[inline]
    #[must_use]
    pub const fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            data: None,
            len: 0,
            capacity: 0,
        }
    }

    /// Creates an empty array with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(arena: &'a Arena, capacity: usize) -> Self {
        let mut array = Self::new(arena);
        array.reserve(capacity);
        array
    }

    /// Creates an array holding a copy of `items`.
    #[must_use]
    pub fn from_slice(arena: &'a Arena, items: &[T]) -> Self {
        let mut array = Self::with_capacity(arena, items.len());
        array.extend_from_slice(items);
        array
    }

    /// Returns the arena this array allocates from.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the array holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the buffer can hold.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a raw pointer to the buffer (dangling while capacity is 0).
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.raw()
    }

    /// Ensures room for `capacity` elements in total.
    ///
    /// A no-op when the buffer is already large enough. Otherwise the first
    /// reservation allocates and later ones reallocate, in place when the
    /// buffer is the arena's latest allocation.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }

        let data = match self.data {
            None => self.arena.alloc_array::<T>(capacity),
            // SAFETY: `data` is this array's live allocation of exactly
            // `self.capacity` elements, and `&mut self` rules out borrows.
            Some(data) => unsafe { self.arena.realloc_array(data, self.capacity, capacity) },
        };

        self.data = Some(data);
        self.capacity = capacity;
    }

    /// Sets the length to `len`.
    ///
    /// Shrinking zeroes the elements `[len, old_len)`. Growing reserves room
    /// and exposes the new elements without writing them: they read as zero
    /// when the arena clears to zero, and as leftover data otherwise.
    pub fn resize(&mut self, len: usize) {
        if len < self.len {
            // SAFETY: `[len, self.len)` lies inside the initialized buffer.
            unsafe { ptr::write_bytes(self.raw().add(len), 0, self.len - len) };
            self.len = len;
        } else if len > self.len {
            self.reserve(len);
            self.len = len;
        }
    }

    /// Appends `value`.
    ///
    /// The first push reserves a single slot; from then on the capacity
    /// doubles whenever the array is about to fill up.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            self.reserve(1);
        }
        if self.len + 1 >= self.capacity {
            self.reserve(self.capacity * 2);
        }

        // SAFETY: `len < capacity` after the reservations above.
        unsafe { self.raw().add(self.len).write(value) };
        self.len += 1;
    }

    /// Removes and returns the last element, zeroing its slot.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub fn pop(&mut self) -> T {
        assert!(self.len > 0, "pop on an empty array");
        self.len -= 1;

        // SAFETY: the slot at the old `len - 1` is initialized and in bounds.
        unsafe {
            let slot = self.raw().add(self.len);
            let value = slot.read();
            ptr::write_bytes(slot, 0, 1);
            value
        }
    }

    /// Appends a copy of every element in `items`.
    pub fn extend_from_slice(&mut self, items: &[T]) {
        let needed = match self.len.checked_add(items.len()) {
            Some(needed) => needed,
            None => panic!("array length overflow"),
        };
        if needed > self.capacity {
            self.reserve(needed.max(self.capacity * 2));
        }

        // SAFETY: the buffer has room for `needed` elements, and `items`
        // cannot alias it while `self` is mutably borrowed.
        unsafe {
            ptr::copy_nonoverlapping(items.as_ptr(), self.raw().add(self.len), items.len());
        }
        self.len = needed;
    }

    /// Removes every element, zeroing them. The buffer is kept.
    pub fn clear(&mut self) {
        self.resize(0);
    }

    /// Returns the elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: arena memory is always initialized and `T: Pod` accepts any
        // bit pattern; the first `len` elements are inside the buffer.
        unsafe { slice::from_raw_parts(self.raw(), self.len) }
    }

    /// Returns the elements as a mutable slice.
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, and `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.raw(), self.len) }
    }

    /// Returns a borrowed [`Span`] over the elements.
    #[inline]
    #[must_use]
    pub fn as_span(&self) -> Span<'_, T> {
        Span::new(self.as_slice())
    }

    #[inline]
    fn raw(&self) -> *mut T {
        self.data.unwrap_or(NonNull::dangling()).as_ptr()
    }
}

impl<T: Pod> Deref for Array<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Pod> DerefMut for Array<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'s, T: Pod> IntoIterator for &'s Array<'_, T> {
    type Item = &'s T;
    type IntoIter = slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'s, T: Pod> IntoIterator for &'s mut Array<'_, T> {
    type Item = &'s mut T;
    type IntoIter = slice::IterMut<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T: Pod> Extend<T> for Array<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Pod> PartialEq for Array<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_span() == other.as_span()
    }
}

impl<T: Pod> Eq for Array<'_, T> {}

impl<T: Pod + fmt::Debug> fmt::Debug for Array<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ArenaFlags;

    fn arena() -> Arena {
        Arena::new(1024, ArenaFlags::CLEAR_TO_ZERO | ArenaFlags::NO_LOG)
    }

    #[test]
    fn test_array_first_push_growth() {
        let arena = arena();
        let mut array: Array<'_, u32> = Array::new(&arena);
        assert_eq!(array.capacity(), 0);

        array.push(1);
        assert_eq!(array.len(), 1);
        assert_eq!(array.capacity(), 2);

        array.push(2);
        assert_eq!(array.capacity(), 4);
        assert!(array.len() <= array.capacity());
    }

    #[test]
    fn test_array_grows_in_place_when_latest() {
        let arena = arena();
        let mut array: Array<'_, u64> = Array::new(&arena);
        array.push(10);
        let start = array.as_ptr();

        for value in 0..20 {
            array.push(value);
        }
        assert_eq!(array.as_ptr(), start);
        assert_eq!(arena.offset(), array.capacity() * 8);
    }

    #[test]
    fn test_array_moves_after_other_allocation() {
        let arena = arena();
        let mut array: Array<'_, u32> = Array::from_slice(&arena, &[1, 2, 3]);
        let start = array.as_ptr();

        let _other = arena.alloc(4, 4);
        array.reserve(16);

        assert_ne!(array.as_ptr(), start);
        assert_eq!(&array[..], &[1, 2, 3]);
    }

    #[test]
    fn test_array_resize_shrink_zeroes_tail() {
        let arena = Arena::new(1024, ArenaFlags::NO_LOG);
        let mut array: Array<'_, u8> = Array::from_slice(&arena, &[9; 8]);

        array.resize(3);
        assert_eq!(&array[..], &[9, 9, 9]);

        // Shrinking zeroes even without CLEAR_TO_ZERO.
        array.resize(8);
        assert_eq!(&array[..], &[9, 9, 9, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_array_pop_zeroes_slot() {
        let arena = arena();
        let mut array: Array<'_, i32> = Array::new(&arena);
        array.extend([5, 6, 7]);

        assert_eq!(array.pop(), 7);
        assert_eq!(array.len(), 2);

        array.resize(3);
        assert_eq!(array[2], 0);
    }

    #[test]
    #[should_panic(expected = "pop on an empty array")]
    fn test_array_pop_empty_panics() {
        let arena = arena();
        let mut array: Array<'_, i32> = Array::new(&arena);
        let _ = array.pop();
    }

    #[test]
    #[should_panic]
    fn test_array_index_out_of_range_panics() {
        let arena = arena();
        let array: Array<'_, i32> = Array::from_slice(&arena, &[1, 2]);
        let _ = array[2];
    }

    #[test]
    fn test_array_clear_keeps_buffer() {
        let arena = arena();
        let mut array: Array<'_, u16> = Array::from_slice(&arena, &[1, 2, 3, 4]);
        let capacity = array.capacity();

        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn test_array_iteration_and_equality() {
        let arena = arena();
        let mut a: Array<'_, u32> = Array::from_slice(&arena, &[1, 2, 3]);
        let b: Array<'_, u32> = Array::from_slice(&arena, &[2, 3, 4]);

        for value in &mut a {
            *value += 1;
        }
        assert_eq!(a, b);
        assert_eq!((&a).into_iter().sum::<u32>(), 9);
    }
}
