//! # ARENAKIT Core
//!
//! The memory substrate every other subsystem sits on:
//! - A chained bump-pointer [`Arena`], the only component that talks to the system allocator
//! - [`Array`], a growable sequence whose storage lives in an arena
//! - [`StableArray`], 64-slot blocks with occupancy masks and pointer-stable slots
//! - [`Text`] and [`TextView`], a byte buffer and its borrowed view
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded** - arenas and everything carved from them stay on one thread
//! 2. **Plain old data only** - stored elements are [`bytemuck::Pod`], nothing is ever dropped
//! 3. **Invariant violations are fatal** - out-of-range access or foreign pointers panic
//!
//! ## Example
//!
//! ```rust
//! use arenakit_core::{Arena, ArenaFlags, Array};
//!
//! let arena = Arena::new(1024, ArenaFlags::CLEAR_TO_ZERO);
//! let mut values: Array<'_, u32> = Array::new(&arena);
//! values.push(7);
//! values.resize(4);
//! assert_eq!(&values[..], &[7, 0, 0, 0]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod containers;
pub mod error;
pub mod memory;
pub mod text;

pub use config::{ArenaConfig, FrameArenas, MemoryConfig};
pub use containers::{Array, Span, StableArray, BLOCK_SLOTS};
pub use error::{ArenaError, ConfigError, TextError};
pub use memory::{Arena, ArenaFlags, ArenaStats, ARENA_BLOCK_ALIGN};
pub use text::{Append, Text, TextView};
