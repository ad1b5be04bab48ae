//! # Arena-Backed Containers
//!
//! Containers that borrow an [`Arena`](crate::Arena) for their storage.
//!
//! ## Design Philosophy
//!
//! - Elements are plain old data ([`bytemuck::Pod`]); nothing is ever dropped
//! - Containers never free memory, the arena reclaims it all at once
//! - A container borrows its arena, so it cannot outlive a clear or free

mod array;
mod span;
mod stable_array;

pub use array::Array;
pub use span::Span;
pub use stable_array::{Iter, IterMut, StableArray, BLOCK_SLOTS};
