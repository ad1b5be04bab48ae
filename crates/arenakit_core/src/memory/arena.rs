//! # Arena Allocator
//!
//! A chained bump-pointer allocator. Each node owns one block from the system
//! allocator and a cursor into it. When a request does not fit, the node
//! lazily creates a successor sized for at least that request and forwards to
//! it, so the chain grows one link at a time.
//!
//! ## Safety Note
//!
//! This module hands out raw pointers into blocks it owns. Blocks are always
//! obtained zero-filled, so every byte an arena returns is initialized memory;
//! the containers rely on that to view allocations as plain old data.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::cell::{Cell, OnceCell};
use std::fmt;
use std::mem;
use std::ops::{BitOr, BitOrAssign};
use std::ptr::{self, NonNull};

use bytemuck::Pod;

use super::stats;
use crate::error::ArenaError;

/// Alignment of every arena block. Requests up to this alignment never need
/// padding at the start of a fresh block.
pub const ARENA_BLOCK_ALIGN: usize = 16;

/// Emits a `tracing` event unless the arena was built with [`ArenaFlags::NO_LOG`].
macro_rules! arena_log {
    ($arena:expr, $level:ident, $($arg:tt)+) => {
        if !$arena.flags.no_log() {
            tracing::$level!($($arg)+);
        }
    };
}

/// Behaviour flags fixed at arena construction.
///
/// Flags are inherited by every successor in the chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ArenaFlags(u8);

impl ArenaFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Reclaimed memory (cleared, shrunk, moved, popped or erased) is zeroed,
    /// so fresh allocations always read as zero.
    pub const CLEAR_TO_ZERO: Self = Self(1 << 0);

    /// Suppress all diagnostic logging for this arena.
    pub const NO_LOG: Self = Self(1 << 1);

    /// Returns the raw flag bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every flag in `other` is also set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both flag sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Shorthand for `contains(ArenaFlags::CLEAR_TO_ZERO)`.
    #[inline]
    #[must_use]
    pub const fn clear_to_zero(self) -> bool {
        self.contains(Self::CLEAR_TO_ZERO)
    }

    /// Shorthand for `contains(ArenaFlags::NO_LOG)`.
    #[inline]
    #[must_use]
    pub const fn no_log(self) -> bool {
        self.contains(Self::NO_LOG)
    }
}

impl BitOr for ArenaFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ArenaFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A chained bump-pointer arena.
///
/// Allocation takes `&self`: the cursor lives in a [`Cell`] and the successor
/// in a write-once [`OnceCell`]. Resetting ([`Arena::clear`]) and releasing
/// ([`Arena::free`]) take `&mut self`, so nothing borrowed from the arena can
/// survive either.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe and is neither `Send` nor `Sync`. Use one
/// arena per thread.
///
/// # Example
///
/// ```rust
/// use arenakit_core::{Arena, ArenaFlags};
///
/// let mut arena = Arena::new(64, ArenaFlags::CLEAR_TO_ZERO);
///
/// let small = arena.alloc(16, 8);
/// assert_eq!(arena.offset(), 16);
///
/// // Too big for this block: a successor sized for the request takes it.
/// let _big = arena.alloc(128, 1);
/// assert_eq!(arena.next().map(|next| next.capacity()), Some(128));
///
/// arena.clear();
/// assert_eq!(arena.alloc(16, 8), small);
/// ```
pub struct Arena {
    /// Start of the owned block, `None` once freed.
    buffer: Option<NonNull<u8>>,
    /// Usable bytes in the block.
    capacity: usize,
    /// Bump cursor, always `<= capacity`.
    offset: Cell<usize>,
    flags: ArenaFlags,
    /// Successor node, created on first overflow and never replaced.
    next: OnceCell<Box<Arena>>,
}

impl Arena {
    /// Creates an arena with `capacity` bytes of zero-filled storage.
    ///
    /// Exhaustion of the system allocator aborts the process.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or too large to describe as an allocation.
    #[must_use]
    pub fn new(capacity: usize, flags: ArenaFlags) -> Self {
        match Self::try_new(capacity, flags) {
            Ok(arena) => arena,
            Err(err) => panic!("arena init failed: {err}"),
        }
    }

    /// Creates an arena, rejecting capacities that cannot back an arena.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ZeroCapacity`] for a zero capacity and
    /// [`ArenaError::CapacityOverflow`] if the block layout would overflow.
    pub fn try_new(capacity: usize, flags: ArenaFlags) -> Result<Self, ArenaError> {
        let layout = block_layout(capacity)?;

        // SAFETY: `block_layout` rejects zero sizes.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(buffer) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout)
        };

        stats::record_init(capacity);
        if !flags.no_log() {
            tracing::debug!(capacity, flags = flags.bits(), "arena initialized");
        }

        Ok(Self {
            buffer: Some(buffer),
            capacity,
            offset: Cell::new(0),
            flags,
            next: OnceCell::new(),
        })
    }

    /// Creates an arena without storage.
    ///
    /// Useful for long-lived slots that are initialized later with
    /// [`Arena::init`]. Allocating from it panics.
    #[must_use]
    pub const fn uninit() -> Self {
        Self {
            buffer: None,
            capacity: 0,
            offset: Cell::new(0),
            flags: ArenaFlags::NONE,
            next: OnceCell::new(),
        }
    }

    /// Releases any current storage and re-initializes in place.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Arena::new`].
    pub fn init(&mut self, capacity: usize, flags: ArenaFlags) {
        self.free();
        *self = Self::new(capacity, flags);
    }

    /// Returns the usable capacity of this node in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the bump offset of this node.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset.get()
    }

    /// Returns the bytes left in this node, ignoring alignment padding.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }

    /// Returns the flags this arena was built with.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> ArenaFlags {
        self.flags
    }

    /// Returns `true` while the arena holds a block.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.buffer.is_some()
    }

    /// Returns the chained successor, if one has been created.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<&Arena> {
        self.next.get().map(Box::as_ref)
    }

    /// Returns the number of initialized nodes in the chain, this one included.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.nodes().count()
    }

    /// Returns the summed capacity of every node in the chain.
    #[must_use]
    pub fn total_capacity(&self) -> usize {
        self.nodes().map(Arena::capacity).sum()
    }

    /// Returns the summed offsets of every node in the chain.
    #[must_use]
    pub fn total_used(&self) -> usize {
        self.nodes().map(Arena::offset).sum()
    }

    /// Returns `true` if `ptr` points into this node's block.
    #[must_use]
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.owns_range(ptr as usize, 0)
    }

    /// Returns `true` if `ptr` points into any block of the chain.
    #[must_use]
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.nodes().any(|node| node.contains(ptr))
    }

    /// Allocates `bytes` bytes aligned to `alignment`.
    ///
    /// Falls through to the successor (creating it with
    /// `max(capacity, bytes)` bytes) when this node cannot fit the request.
    ///
    /// # Panics
    ///
    /// Panics if the arena was freed or `alignment` is not a power of two.
    pub fn alloc(&self, bytes: usize, alignment: usize) -> NonNull<u8> {
        assert!(
            alignment.is_power_of_two(),
            "alignment {alignment} is not a power of two"
        );
        let buffer = self.live_buffer();

        let base = buffer.as_ptr() as usize;
        let fit = align_up(base + self.offset.get(), alignment)
            .map(|addr| addr - base)
            .and_then(|aligned| Some((aligned, aligned.checked_add(bytes)?)));

        if let Some((aligned, end)) = fit {
            // A zero-byte request still needs an address inside the block.
            if aligned < self.capacity && end <= self.capacity {
                self.offset.set(end);
                // SAFETY: `aligned < capacity`, so the result lies inside
                // this block.
                return unsafe { NonNull::new_unchecked(buffer.as_ptr().add(aligned)) };
            }
        }

        self.successor_for(bytes, alignment).alloc(bytes, alignment)
    }

    /// Allocates room for `count` values of `T`.
    ///
    /// The memory is initialized: zero under [`ArenaFlags::CLEAR_TO_ZERO`],
    /// otherwise possibly left over from before the last [`Arena::clear`].
    ///
    /// # Panics
    ///
    /// Panics if the byte size overflows or the arena was freed.
    pub fn alloc_array<T: Pod>(&self, count: usize) -> NonNull<T> {
        self.alloc(array_bytes::<T>(count), mem::align_of::<T>()).cast()
    }

    /// Resizes an allocation, in place when it is the most recent one.
    ///
    /// If `prev` is the latest allocation of its node, the node rewinds over
    /// it before allocating again, so growth that still fits keeps the same
    /// address. Otherwise the contents are copied to the new location. Under
    /// [`ArenaFlags::CLEAR_TO_ZERO`] every byte given up is zeroed.
    ///
    /// # Safety
    ///
    /// `prev` must be a live allocation of exactly `prev_size` bytes obtained
    /// from this arena chain, and no reference into it may be alive. After the
    /// call `prev` must no longer be used unless it equals the returned pointer.
    ///
    /// # Panics
    ///
    /// Panics if `prev` is not owned by the chain or the arena was freed.
    pub unsafe fn realloc(
        &self,
        prev: NonNull<u8>,
        prev_size: usize,
        new_size: usize,
        alignment: usize,
    ) -> NonNull<u8> {
        let buffer = self.live_buffer();

        if prev_size == new_size {
            arena_log!(self, warn, size = new_size, "realloc to the same size");
            return prev;
        }

        let prev_addr = prev.as_ptr() as usize;

        if !self.owns_range(prev_addr, prev_size) {
            let Some(next) = self.next.get() else {
                panic!("realloc of a pointer not owned by the arena chain");
            };
            // SAFETY: forwarded caller contract.
            return unsafe { next.realloc(prev, prev_size, new_size, alignment) };
        }

        let offset = self.offset.get();
        if prev_addr + prev_size == buffer.as_ptr() as usize + offset {
            self.offset.set(offset - prev_size);
        }

        let fresh = self.alloc(new_size, alignment);
        let clear = self.flags.clear_to_zero();

        if fresh == prev {
            if clear && new_size < prev_size {
                // SAFETY: the tail lies inside the old allocation.
                unsafe { ptr::write_bytes(prev.as_ptr().add(new_size), 0, prev_size - new_size) };
            }
            return fresh;
        }

        // SAFETY: both ranges are arena memory of at least the copied length;
        // after a rewind they may overlap, hence `copy` rather than
        // `copy_nonoverlapping`.
        unsafe { ptr::copy(prev.as_ptr(), fresh.as_ptr(), prev_size.min(new_size)) };

        if clear {
            // SAFETY: only bytes of the old allocation outside the new one are
            // written.
            unsafe { zero_uncovered(prev, prev_size, fresh, new_size) };
        }

        fresh
    }

    /// Typed form of [`Arena::realloc`], counted in elements of `T`.
    ///
    /// # Safety
    ///
    /// Same contract as [`Arena::realloc`], with `prev` covering `prev_count`
    /// elements.
    pub unsafe fn realloc_array<T: Pod>(
        &self,
        prev: NonNull<T>,
        prev_count: usize,
        new_count: usize,
    ) -> NonNull<T> {
        let prev_size = array_bytes::<T>(prev_count);
        let new_size = array_bytes::<T>(new_count);
        // SAFETY: forwarded caller contract.
        unsafe { self.realloc(prev.cast(), prev_size, new_size, mem::align_of::<T>()) }.cast()
    }

    /// Resets every node of the chain to empty, keeping their blocks.
    ///
    /// Under [`ArenaFlags::CLEAR_TO_ZERO`] all previously handed out bytes are
    /// zeroed first.
    pub fn clear(&mut self) {
        if let Some(buffer) = self.buffer {
            let used = self.offset.get();
            if self.flags.clear_to_zero() {
                // SAFETY: `[0, offset)` lies inside the block.
                unsafe { ptr::write_bytes(buffer.as_ptr(), 0, used) };
            }
            self.offset.set(0);
            arena_log!(self, debug, used, capacity = self.capacity, "arena cleared");
        }

        if let Some(next) = self.next.get_mut() {
            next.clear();
        }
    }

    /// Releases every node of the chain back to the system allocator.
    ///
    /// The arena must be re-initialized with [`Arena::init`] before reuse.
    /// Freeing twice is harmless.
    pub fn free(&mut self) {
        if let Some(mut next) = self.next.take() {
            next.free();
        }

        if let Some(buffer) = self.buffer.take() {
            // SAFETY: this exact layout was validated when the block was
            // allocated.
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.capacity, ARENA_BLOCK_ALIGN);
                alloc::dealloc(buffer.as_ptr(), layout);
            }
            stats::record_free(self.capacity);
            arena_log!(self, debug, capacity = self.capacity, "arena freed");
        }

        self.capacity = 0;
        self.offset.set(0);
    }

    fn live_buffer(&self) -> NonNull<u8> {
        match self.buffer {
            Some(buffer) => buffer,
            None => panic!("use of an arena that is uninitialized or freed"),
        }
    }

    fn owns_range(&self, start: usize, len: usize) -> bool {
        let Some(buffer) = self.buffer else {
            return false;
        };
        let base = buffer.as_ptr() as usize;
        let end = base + self.capacity;
        start >= base && start < end && start.saturating_add(len) <= end
    }

    fn successor_for(&self, bytes: usize, alignment: usize) -> &Arena {
        self.next.get_or_init(|| {
            let headroom = if alignment > ARENA_BLOCK_ALIGN { alignment - 1 } else { 0 };
            let capacity = self.capacity.max(bytes.saturating_add(headroom));
            arena_log!(
                self,
                info,
                requested = bytes,
                capacity,
                "arena exhausted, chaining successor"
            );
            Box::new(Arena::new(capacity, self.flags))
        })
    }

    fn nodes(&self) -> impl Iterator<Item = &Arena> {
        std::iter::successors(Some(self), |node| node.next())
            .take_while(|node| node.is_initialized())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::uninit()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.free();
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("offset", &self.offset.get())
            .field("flags", &self.flags)
            .field("chain_len", &self.chain_len())
            .finish()
    }
}

fn block_layout(capacity: usize) -> Result<Layout, ArenaError> {
    if capacity == 0 {
        return Err(ArenaError::ZeroCapacity);
    }
    Layout::from_size_align(capacity, ARENA_BLOCK_ALIGN)
        .map_err(|_| ArenaError::CapacityOverflow { capacity })
}

fn array_bytes<T>(count: usize) -> usize {
    match mem::size_of::<T>().checked_mul(count) {
        Some(bytes) => bytes,
        None => panic!("array of {count} elements overflows the address space"),
    }
}

/// Rounds `addr` up to `alignment`, or `None` past the end of the address space.
#[inline]
const fn align_up(addr: usize, alignment: usize) -> Option<usize> {
    match addr.checked_add(alignment - 1) {
        Some(bumped) => Some(bumped & !(alignment - 1)),
        None => None,
    }
}

/// Zeroes the bytes of `[old, old + old_len)` not covered by `[new, new + new_len)`.
///
/// # Safety
///
/// The old range must be writable arena memory.
unsafe fn zero_uncovered(old: NonNull<u8>, old_len: usize, new: NonNull<u8>, new_len: usize) {
    let old_start = old.as_ptr() as usize;
    let old_end = old_start + old_len;
    let new_start = new.as_ptr() as usize;
    let new_end = new_start + new_len;

    let head_end = old_end.min(new_start);
    if old_start < head_end {
        // SAFETY: `[old_start, head_end)` is a prefix of the old range.
        unsafe { ptr::write_bytes(old.as_ptr(), 0, head_end - old_start) };
    }

    let tail_start = old_start.max(new_end);
    if tail_start < old_end {
        // SAFETY: `[tail_start, old_end)` is a suffix of the old range.
        unsafe {
            ptr::write_bytes(
                old.as_ptr().add(tail_start - old_start),
                0,
                old_end - tail_start,
            );
        }
    }
}
