//! # Text View
//!
//! A borrowed `{pointer, length}` window onto text bytes.

use std::any;
use std::fmt;
use std::str::FromStr;

use crate::error::{TextError, TextResult};

/// A non-owning view of text bytes.
///
/// Borrowing from a [`Text`](crate::Text) ties the view to it, so the text
/// cannot grow (and move its buffer) while a view is alive.
///
/// Equality is byte-exact: lengths first, then contents, so a shared prefix
/// never compares equal.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextView<'s> {
    bytes: &'s [u8],
}

impl<'s> TextView<'s> {
    /// Creates a view over raw bytes.
    #[inline]
    #[must_use]
    pub const fn new(bytes: &'s [u8]) -> Self {
        Self { bytes }
    }

    /// Creates a view over a string literal or other `&str`.
    #[inline]
    #[must_use]
    pub const fn literal(text: &'s str) -> Self {
        Self::new(text.as_bytes())
    }

    /// Returns the length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the view has no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the viewed bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'s [u8] {
        self.bytes
    }

    /// Returns the `length` bytes starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie inside the view.
    #[must_use]
    pub fn substr(&self, start: usize, length: usize) -> TextView<'s> {
        let end = start.checked_add(length);
        assert!(
            end.is_some_and(|end| end <= self.bytes.len()),
            "substr {start}+{length} out of range for length {}",
            self.bytes.len()
        );
        TextView::new(&self.bytes[start..start + length])
    }

    /// Returns `true` if the view begins with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.bytes.starts_with(prefix.as_ref())
    }

    /// Returns `true` if the view ends with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: impl AsRef<[u8]>) -> bool {
        self.bytes.ends_with(suffix.as_ref())
    }

    /// Returns the index of the first `byte` at or after `start`.
    ///
    /// `None` means not found; a `start` past the end finds nothing.
    #[must_use]
    pub fn find(&self, byte: u8, start: usize) -> Option<usize> {
        self.bytes
            .get(start..)?
            .iter()
            .position(|&b| b == byte)
            .map(|index| index + start)
    }

    /// Returns the index of the last `byte` in the view.
    #[must_use]
    pub fn rfind(&self, byte: u8) -> Option<usize> {
        self.bytes.iter().rposition(|&b| b == byte)
    }

    /// Returns the view without leading and trailing ASCII whitespace.
    #[must_use]
    pub fn trim(&self) -> TextView<'s> {
        let start = self
            .bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.bytes.len());
        let end = self
            .bytes
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(start, |index| index + 1);
        TextView::new(&self.bytes[start..end])
    }

    /// Splits around the first `byte`, which belongs to neither half.
    #[must_use]
    pub fn split_once(&self, byte: u8) -> Option<(TextView<'s>, TextView<'s>)> {
        let index = self.find(byte, 0)?;
        Some((
            TextView::new(&self.bytes[..index]),
            TextView::new(&self.bytes[index + 1..]),
        ))
    }

    /// Returns the bytes as `&str`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn to_str(&self) -> TextResult<&'s str> {
        std::str::from_utf8(self.bytes).map_err(|err| TextError::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
        })
    }

    /// Parses the (untrimmed) text as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidUtf8`] for non-UTF-8 bytes and
    /// [`TextError::Parse`] when `T` rejects the text.
    pub fn parse<T: FromStr>(&self) -> TextResult<T> {
        let text = self.to_str()?;
        text.parse().map_err(|_| TextError::Parse {
            text: text.to_owned(),
            target: any::type_name::<T>(),
        })
    }
}

impl<'s> From<&'s str> for TextView<'s> {
    fn from(text: &'s str) -> Self {
        Self::literal(text)
    }
}

impl<'s> From<&'s [u8]> for TextView<'s> {
    fn from(bytes: &'s [u8]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for TextView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl PartialEq<str> for TextView<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for TextView<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl fmt::Display for TextView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.bytes), f)
    }
}

impl fmt::Debug for TextView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.bytes), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_equality_is_length_exact() {
        let view = TextView::literal("ac");
        assert_eq!(view, "ac");
        assert_ne!(view, "ac  ");
        assert_ne!(view, "a");
        assert_ne!(view, TextView::literal("ab"));
    }

    #[test]
    fn test_view_substr() {
        let view = TextView::literal("position = 1.5");
        assert_eq!(view.substr(0, 8), "position");
        assert_eq!(view.substr(11, 3), "1.5");
        assert!(view.substr(14, 0).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_view_substr_out_of_range() {
        let _ = TextView::literal("abc").substr(2, 5);
    }

    #[test]
    fn test_view_prefix_suffix() {
        let view = TextView::literal("shaders/mesh.wgsl");
        assert!(view.starts_with("shaders/"));
        assert!(view.ends_with(".wgsl"));
        assert!(!view.starts_with("shaders/mesh.wgsl/"));
        assert!(view.ends_with(TextView::literal("")));
    }

    #[test]
    fn test_view_find() {
        let view = TextView::literal("a=b=c");
        assert_eq!(view.find(b'=', 0), Some(1));
        assert_eq!(view.find(b'=', 2), Some(3));
        assert_eq!(view.find(b'=', 4), None);
        assert_eq!(view.find(b'=', 99), None);
        assert_eq!(view.find(b'x', 0), None);
        assert_eq!(view.rfind(b'='), Some(3));
    }

    #[test]
    fn test_view_trim_and_split() {
        let view = TextView::literal("  width = 1280 \n");
        let (key, value) = view.trim().split_once(b'=').unwrap();
        assert_eq!(key.trim(), "width");
        assert_eq!(value.trim().parse::<u32>(), Ok(1280));
        assert!(TextView::literal("   ").trim().is_empty());
    }

    #[test]
    fn test_view_utf8_errors() {
        let bad = TextView::new(&[b'o', b'k', 0xFF]);
        assert_eq!(bad.to_str(), Err(TextError::InvalidUtf8 { valid_up_to: 2 }));
        assert!(matches!(
            TextView::literal("1.5x").parse::<f32>(),
            Err(TextError::Parse { .. })
        ));
    }
}
