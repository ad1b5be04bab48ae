//! # Memory Management
//!
//! The chained bump allocator and its diagnostics.
//!
//! ## Design Philosophy
//!
//! Memory is reserved in large blocks up front. During a frame:
//! - Allocation is a pointer bump
//! - Nothing is freed individually
//! - Clearing an arena keeps its blocks for the next round

mod arena;
pub mod stats;

pub use arena::{Arena, ArenaFlags, ARENA_BLOCK_ALIGN};
pub use stats::ArenaStats;
