//! # Span
//!
//! A borrowed, bounds-checked view over contiguous plain-old-data elements.

use std::fmt;
use std::ops::Deref;

use bytemuck::Pod;

/// A non-owning `{pointer, length}` view over an [`Array`](crate::Array) or
/// any slice.
///
/// Equality compares the raw bytes of the elements, so two spans are equal
/// exactly when they have the same length and identical contents.
#[derive(Clone, Copy)]
pub struct Span<'s, T: Pod> {
    items: &'s [T],
}

impl<'s, T: Pod> Span<'s, T> {
    /// Wraps a slice.
    #[inline]
    #[must_use]
    pub const fn new(items: &'s [T]) -> Self {
        Self { items }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the span has no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the element at `index`, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'s T> {
        self.items.get(index)
    }

    /// Returns the sub-span `[start, start + len)`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie inside the span.
    #[must_use]
    pub fn slice(&self, start: usize, len: usize) -> Span<'s, T> {
        let end = start.checked_add(len);
        assert!(
            end.is_some_and(|end| end <= self.items.len()),
            "span slice {start}+{len} out of range for length {}",
            self.items.len()
        );
        Span::new(&self.items[start..start + len])
    }

    /// Returns the underlying slice.
    #[inline]
    #[must_use]
    pub const fn as_slice(&self) -> &'s [T] {
        self.items
    }

    /// Returns the elements as raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &'s [u8] {
        bytemuck::cast_slice(self.items)
    }
}

impl<T: Pod> Deref for Span<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.items
    }
}

impl<'s, T: Pod> From<&'s [T]> for Span<'s, T> {
    fn from(items: &'s [T]) -> Self {
        Self::new(items)
    }
}

impl<'s, T: Pod> IntoIterator for Span<'s, T> {
    type Item = &'s T;
    type IntoIter = std::slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Pod> PartialEq for Span<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<T: Pod> Eq for Span<'_, T> {}

impl<T: Pod + fmt::Debug> fmt::Debug for Span<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_slice() {
        let values = [1u32, 2, 3, 4, 5];
        let span = Span::new(&values);

        let middle = span.slice(1, 3);
        assert_eq!(middle.as_slice(), &[2, 3, 4]);
        assert_eq!(middle.len(), 3);
        assert!(span.slice(5, 0).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_span_slice_out_of_range() {
        let values = [1u32, 2, 3];
        let _ = Span::new(&values).slice(2, 2);
    }

    #[test]
    fn test_span_byte_equality() {
        let a = [1u16, 2, 3];
        let b = [1u16, 2, 3];
        let c = [1u16, 2];

        assert_eq!(Span::new(&a), Span::new(&b));
        assert_ne!(Span::new(&a), Span::new(&c));
        assert_eq!(Span::new(&a).as_bytes().len(), 6);
    }

    #[test]
    fn test_span_get() {
        let values = [9i64, 8];
        let span = Span::new(&values);
        assert_eq!(span.get(1), Some(&8));
        assert_eq!(span.get(2), None);
        assert_eq!(span.iter().copied().sum::<i64>(), 17);
    }
}
