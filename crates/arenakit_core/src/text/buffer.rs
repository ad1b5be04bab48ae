//! # Text Buffer
//!
//! An owning, growable byte string backed by an [`Array<u8>`].

use std::fmt;

use super::{Append, TextView};
use crate::containers::Array;
use crate::error::TextResult;
use crate::memory::Arena;

/// A growable byte string whose storage lives in an arena.
///
/// Growth and zeroing follow [`Array`]: appends grow in place while the text
/// is the arena's latest allocation, and truncation zeroes the dropped bytes.
///
/// # Example
///
/// ```rust
/// use arenakit_core::{Arena, ArenaFlags, Text};
///
/// let arena = Arena::new(256, ArenaFlags::CLEAR_TO_ZERO);
/// let mut line = Text::from_str_in(&arena, "fps=");
/// line.append(120u32).append(' ').append(-0.5f32);
///
/// assert_eq!(line, "fps=120 -0.5");
/// assert_eq!(line.view().find(b' ', 0), Some(7));
/// ```
pub struct Text<'a> {
    bytes: Array<'a, u8>,
}

impl<'a> Text<'a> {
    /// Creates an empty text. Nothing is allocated until the first append.
    #[inline]
    #[must_use]
    pub const fn new(arena: &'a Arena) -> Self {
        Self {
            bytes: Array::new(arena),
        }
    }

    /// Creates an empty text with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(arena: &'a Arena, capacity: usize) -> Self {
        Self {
            bytes: Array::with_capacity(arena, capacity),
        }
    }

    /// Creates a text holding a copy of `bytes`.
    #[must_use]
    pub fn from_bytes_in(arena: &'a Arena, bytes: &[u8]) -> Self {
        Self {
            bytes: Array::from_slice(arena, bytes),
        }
    }

    /// Creates a text holding a copy of `text`.
    #[must_use]
    pub fn from_str_in(arena: &'a Arena, text: &str) -> Self {
        Self::from_bytes_in(arena, text.as_bytes())
    }

    /// Returns the length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the text has no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the buffer capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Returns the text bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Returns a view borrowing this text.
    #[inline]
    #[must_use]
    pub fn view(&self) -> TextView<'_> {
        TextView::new(self.as_bytes())
    }

    /// Returns the text as `&str`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidUtf8`](crate::TextError::InvalidUtf8) if
    /// the bytes are not UTF-8.
    pub fn to_str(&self) -> TextResult<&str> {
        self.view().to_str()
    }

    /// Ensures room for `capacity` bytes in total.
    pub fn reserve(&mut self, capacity: usize) {
        self.bytes.reserve(capacity);
    }

    /// Sets the length, zeroing dropped bytes when shrinking.
    pub fn resize(&mut self, len: usize) {
        self.bytes.resize(len);
    }

    /// Removes all bytes, keeping the buffer.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Appends a single byte.
    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Appends raw bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Appends anything implementing [`Append`] and returns `self` for
    /// chaining.
    pub fn append<A: Append>(&mut self, value: A) -> &mut Self {
        value.append_to(self);
        self
    }
}

impl fmt::Write for Text<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_bytes(s.as_bytes());
        Ok(())
    }
}

impl PartialEq for Text<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Text<'_> {}

impl PartialEq<str> for Text<'_> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Text<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<TextView<'_>> for Text<'_> {
    fn eq(&self, other: &TextView<'_>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}

impl fmt::Debug for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}
