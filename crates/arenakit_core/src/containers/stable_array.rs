//! # Stable Array
//!
//! A chain of fixed 64-slot blocks allocated from an arena. Each block tracks
//! live slots in a 64-bit occupancy mask, so insertion and removal never move
//! an element: the address returned by [`StableArray::push`] stays valid until
//! that element is erased.
//!
//! ## Layout
//!
//! ```text
//!   head ──► ┌──────────────────────┐     ┌──────────────────────┐
//!            │ occupied: u64        │ ┌─► │ occupied: u64        │
//!            │ next ────────────────┼─┘   │ next: None           │
//!            │ slots: [T; 64]       │     │ slots: [T; 64]       │
//!            └──────────────────────┘     └──────────────────────┘
//! ```
//!
//! ## Safety Note
//!
//! Blocks are reached through raw pointers only; no reference to a whole
//! block is ever formed, so slot pointers handed to callers are never
//! invalidated by later pushes or erases elsewhere in the block.

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use bytemuck::Pod;

use crate::memory::Arena;

/// Number of slots per block (one bit of the occupancy mask each).
pub const BLOCK_SLOTS: usize = 64;

#[repr(C)]
struct Block<T> {
    /// Bit `i` set ⇔ slot `i` holds a live element.
    occupied: u64,
    next: Option<NonNull<Block<T>>>,
    slots: [T; BLOCK_SLOTS],
}

impl<T> Block<T> {
    /// # Safety
    ///
    /// `block` must point to a live, initialized block.
    #[inline]
    unsafe fn occupied(block: NonNull<Self>) -> *mut u64 {
        // SAFETY: caller contract.
        unsafe { ptr::addr_of_mut!((*block.as_ptr()).occupied) }
    }

    /// # Safety
    ///
    /// `block` must point to a live, initialized block.
    #[inline]
    unsafe fn next(block: NonNull<Self>) -> *mut Option<NonNull<Self>> {
        // SAFETY: caller contract.
        unsafe { ptr::addr_of_mut!((*block.as_ptr()).next) }
    }

    /// # Safety
    ///
    /// `block` must point to a live block and `index <= BLOCK_SLOTS`.
    #[inline]
    unsafe fn slot(block: NonNull<Self>, index: usize) -> *mut T {
        // SAFETY: caller contract; one-past-the-end is allowed for range tests.
        unsafe { ptr::addr_of_mut!((*block.as_ptr()).slots).cast::<T>().add(index) }
    }
}

/// A pointer-stable container of plain-old-data elements.
///
/// Elements live in arena-allocated blocks of [`BLOCK_SLOTS`] slots. Freed
/// slots are reused lowest index first, blocks are never unlinked, and
/// iteration visits live elements in ascending (block, slot) order.
///
/// # Example
///
/// ```rust
/// use arenakit_core::{Arena, ArenaFlags, StableArray};
///
/// let arena = Arena::new(4096, ArenaFlags::CLEAR_TO_ZERO);
/// let mut bodies: StableArray<'_, [f32; 3]> = StableArray::new(&arena);
///
/// let a = bodies.push([0.0, 1.0, 0.0]);
/// let b = bodies.push([2.0, 0.0, 0.0]);
/// bodies.erase(a);
///
/// // `b` did not move, and the freed slot is reused first.
/// assert_eq!(bodies.get(b), Some(&[2.0, 0.0, 0.0]));
/// assert_eq!(bodies.push([5.0, 5.0, 5.0]), a);
/// ```
pub struct StableArray<'a, T: Pod> {
    arena: &'a Arena,
    /// First block, materialized on the first push.
    head: Option<NonNull<Block<T>>>,
    len: usize,
}

impl<'a, T: Pod> StableArray<'a, T> {
    /// Creates an empty container. No block is allocated until the first push.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized, since slots are located by address.
    #[must_use]
    pub fn new(arena: &'a Arena) -> Self {
        assert!(
            mem::size_of::<T>() > 0,
            "StableArray does not support zero-sized elements"
        );
        Self {
            arena,
            head: None,
            len: 0,
        }
    }

    /// Returns the arena the blocks are allocated from.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Returns the number of live elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no element is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of blocks materialized so far.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Stores `value` in the first free slot and returns its stable address.
    ///
    /// Free slots are found with a trailing-ones scan of each block's mask, so
    /// the lowest free index of the first non-full block wins. A new block is
    /// chained when every existing block is full.
    pub fn push(&mut self, value: T) -> NonNull<T> {
        let mut block = match self.head {
            Some(head) => head,
            None => {
                let head = self.new_block();
                self.head = Some(head);
                head
            }
        };

        loop {
            // SAFETY: every block in the chain is a live arena allocation owned
            // by this container, and `&mut self` makes access exclusive.
            unsafe {
                let occupied = Block::occupied(block);
                let index = (*occupied).trailing_ones() as usize;

                if index < BLOCK_SLOTS {
                    *occupied |= 1u64 << index;
                    let slot = Block::slot(block, index);
                    slot.write(value);
                    self.len += 1;
                    return NonNull::new_unchecked(slot);
                }

                let next = Block::next(block);
                block = match *next {
                    Some(next) => next,
                    None => {
                        let fresh = self.new_block();
                        *next = Some(fresh);
                        fresh
                    }
                };
            }
        }
    }

    /// Removes the element at `ptr`, freeing its slot for reuse.
    ///
    /// Under [`ArenaFlags::CLEAR_TO_ZERO`](crate::ArenaFlags::CLEAR_TO_ZERO)
    /// the slot is zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` was not returned by [`StableArray::push`] on this
    /// container, or if its element was already erased.
    pub fn erase(&mut self, ptr: NonNull<T>) {
        let Some((block, index)) = self.locate(ptr.as_ptr()) else {
            panic!("erase of a pointer not owned by this StableArray");
        };

        // SAFETY: `locate` only returns live blocks of this chain and in-range
        // slot indices.
        unsafe {
            let occupied = Block::occupied(block);
            let bit = 1u64 << index;
            assert!(*occupied & bit != 0, "erase of a slot that is not live");

            *occupied &= !bit;
            if self.arena.flags().clear_to_zero() {
                ptr::write_bytes(Block::slot(block, index), 0, 1);
            }
        }
        self.len -= 1;
    }

    /// Empties every block without releasing any of them.
    pub fn clear(&mut self) {
        let clear = self.arena.flags().clear_to_zero();
        for block in self.blocks() {
            // SAFETY: live block of this chain, exclusive through `&mut self`.
            unsafe {
                *Block::occupied(block) = 0;
                if clear {
                    ptr::write_bytes(Block::slot(block, 0), 0, BLOCK_SLOTS);
                }
            }
        }
        self.len = 0;
    }

    /// Returns `true` if `ptr` addresses a live element of this container.
    #[must_use]
    pub fn contains(&self, ptr: *const T) -> bool {
        self.live_slot(ptr).is_some()
    }

    /// Returns the live element at `ptr`, or `None` if `ptr` is not one.
    #[must_use]
    pub fn get(&self, ptr: NonNull<T>) -> Option<&T> {
        // SAFETY: live slot, shared borrow of `self` blocks mutation.
        self.live_slot(ptr.as_ptr()).map(|slot| unsafe { &*slot })
    }

    /// Returns the live element at `ptr` mutably, or `None` if `ptr` is not one.
    #[must_use]
    pub fn get_mut(&mut self, ptr: NonNull<T>) -> Option<&mut T> {
        // SAFETY: live slot, exclusive through `&mut self`.
        self.live_slot(ptr.as_ptr()).map(|slot| unsafe { &mut *slot })
    }

    /// Iterates over live elements in ascending (block, slot) order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            cursor: Cursor::new(self.head),
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Iterates mutably over live elements in ascending (block, slot) order.
    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            cursor: Cursor::new(self.head),
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    fn new_block(&self) -> NonNull<Block<T>> {
        let block = self
            .arena
            .alloc(mem::size_of::<Block<T>>(), mem::align_of::<Block<T>>())
            .cast::<Block<T>>();

        // SAFETY: fresh, suitably aligned arena memory. Slots are initialized
        // arena bytes, valid for `T: Pod`; only the header needs writing.
        unsafe {
            Block::occupied(block).write(0);
            Block::next(block).write(None);
        }
        block
    }

    fn blocks(&self) -> impl Iterator<Item = NonNull<Block<T>>> + '_ {
        // SAFETY: chain links only ever point at live blocks.
        std::iter::successors(self.head, |&block| unsafe { *Block::next(block) })
    }

    /// Finds the block and slot index addressed by `ptr`.
    fn locate(&self, ptr: *const T) -> Option<(NonNull<Block<T>>, usize)> {
        let addr = ptr as usize;
        let size = mem::size_of::<T>();

        self.blocks().find_map(|block| {
            // SAFETY: live block; one-past-the-end slot pointer is in bounds.
            let start = unsafe { Block::slot(block, 0) } as usize;
            let end = start + BLOCK_SLOTS * size;
            if addr < start || addr >= end || (addr - start) % size != 0 {
                return None;
            }
            Some((block, (addr - start) / size))
        })
    }

    fn live_slot(&self, ptr: *const T) -> Option<*mut T> {
        let (block, index) = self.locate(ptr)?;
        // SAFETY: `locate` returned a live block and in-range index.
        unsafe {
            if *Block::occupied(block) & (1u64 << index) == 0 {
                return None;
            }
            Some(Block::slot(block, index))
        }
    }
}

impl<'s, T: Pod> IntoIterator for &'s StableArray<'_, T> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, T: Pod> IntoIterator for &'s mut StableArray<'_, T> {
    type Item = &'s mut T;
    type IntoIter = IterMut<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for StableArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Walks the chain one live slot at a time: `(current block, bits left)`.
struct Cursor<T> {
    block: Option<NonNull<Block<T>>>,
    mask: u64,
}

impl<T> Cursor<T> {
    fn new(head: Option<NonNull<Block<T>>>) -> Self {
        // SAFETY: the head, if any, is a live block.
        let mask = head.map_or(0, |block| unsafe { *Block::occupied(block) });
        Self { block: head, mask }
    }

    /// Returns the next live slot, skipping blocks whose mask is empty.
    fn advance(&mut self) -> Option<*mut T> {
        loop {
            let block = self.block?;
            if self.mask != 0 {
                let index = self.mask.trailing_zeros() as usize;
                self.mask &= self.mask - 1;
                // SAFETY: set bits are always below BLOCK_SLOTS.
                return Some(unsafe { Block::slot(block, index) });
            }

            // SAFETY: chain links only ever point at live blocks.
            unsafe {
                self.block = *Block::next(block);
                self.mask = self.block.map_or(0, |next| *Block::occupied(next));
            }
        }
    }
}

/// Iterator over the live elements of a [`StableArray`].
pub struct Iter<'s, T: Pod> {
    cursor: Cursor<T>,
    remaining: usize,
    _marker: PhantomData<&'s T>,
}

impl<'s, T: Pod> Iterator for Iter<'s, T> {
    type Item = &'s T;

    fn next(&mut self) -> Option<&'s T> {
        let slot = self.cursor.advance()?;
        self.remaining -= 1;
        // SAFETY: live slot; the container is borrowed for `'s`.
        Some(unsafe { &*slot })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Pod> ExactSizeIterator for Iter<'_, T> {}
impl<T: Pod> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over the live elements of a [`StableArray`].
pub struct IterMut<'s, T: Pod> {
    cursor: Cursor<T>,
    remaining: usize,
    _marker: PhantomData<&'s mut T>,
}

impl<'s, T: Pod> Iterator for IterMut<'s, T> {
    type Item = &'s mut T;

    fn next(&mut self) -> Option<&'s mut T> {
        let slot = self.cursor.advance()?;
        self.remaining -= 1;
        // SAFETY: each live slot is yielded once; the container is mutably
        // borrowed for `'s`.
        Some(unsafe { &mut *slot })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Pod> ExactSizeIterator for IterMut<'_, T> {}
impl<T: Pod> FusedIterator for IterMut<'_, T> {}
