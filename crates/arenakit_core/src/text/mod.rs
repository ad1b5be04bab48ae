//! # Text
//!
//! Byte strings for an arena world: [`Text`] owns a growable buffer carved
//! from an arena, [`TextView`] borrows bytes from a `Text` or from static
//! storage.
//!
//! Bytes are not required to be UTF-8. Conversions to `&str` are checked.

mod append;
mod buffer;
mod view;

pub use append::Append;
pub use buffer::Text;
pub use view::TextView;
