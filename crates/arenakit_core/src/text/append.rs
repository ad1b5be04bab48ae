//! # Append
//!
//! Everything that can be appended to a [`Text`]: raw bytes, strings,
//! characters, views, and the decimal rendering of numbers.

use std::fmt::Write;

use super::{Text, TextView};

/// A value that can be appended to a [`Text`].
///
/// Integers and floats are written in decimal. Floats use the shortest
/// representation that parses back to the same value, so appended numbers
/// round-trip through [`TextView::parse`].
pub trait Append {
    /// Appends `self` to `text`.
    fn append_to(self, text: &mut Text<'_>);
}

impl Append for &[u8] {
    fn append_to(self, text: &mut Text<'_>) {
        text.push_bytes(self);
    }
}

impl<const N: usize> Append for &[u8; N] {
    fn append_to(self, text: &mut Text<'_>) {
        text.push_bytes(self);
    }
}

impl Append for &str {
    fn append_to(self, text: &mut Text<'_>) {
        text.push_bytes(self.as_bytes());
    }
}

impl Append for char {
    fn append_to(self, text: &mut Text<'_>) {
        let mut utf8 = [0u8; 4];
        text.push_bytes(self.encode_utf8(&mut utf8).as_bytes());
    }
}

impl Append for TextView<'_> {
    fn append_to(self, text: &mut Text<'_>) {
        text.push_bytes(self.as_bytes());
    }
}

impl Append for &Text<'_> {
    fn append_to(self, text: &mut Text<'_>) {
        text.push_bytes(self.as_bytes());
    }
}

macro_rules! impl_append_decimal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Append for $ty {
                fn append_to(self, text: &mut Text<'_>) {
                    // Writing into a Text cannot fail.
                    let _ = write!(text, "{self}");
                }
            }
        )*
    };
}

impl_append_decimal!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);
