//! # Arena Diagnostics
//!
//! Leak counters for arenas: how many are alive and how many bytes they hold.
//!
//! Counters are only maintained in builds with `debug_assertions`; release
//! builds always report zero. Arenas never leave the thread that created them,
//! so the counters are per thread as well.

use std::cell::Cell;

thread_local! {
    static ACTIVE_ARENAS: Cell<usize> = const { Cell::new(0) };
    static RESERVED_BYTES: Cell<usize> = const { Cell::new(0) };
}

/// Snapshot of the arena counters for the current thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Arena nodes (roots and chained successors) currently holding a block.
    pub active_arenas: usize,
    /// Total bytes reserved from the system allocator by those nodes.
    pub reserved_bytes: usize,
}

/// Returns the current counters.
#[must_use]
pub fn snapshot() -> ArenaStats {
    ArenaStats {
        active_arenas: ACTIVE_ARENAS.with(Cell::get),
        reserved_bytes: RESERVED_BYTES.with(Cell::get),
    }
}

pub(crate) fn record_init(capacity: usize) {
    if cfg!(debug_assertions) {
        ACTIVE_ARENAS.with(|count| count.set(count.get() + 1));
        RESERVED_BYTES.with(|bytes| bytes.set(bytes.get() + capacity));
    }
}

pub(crate) fn record_free(capacity: usize) {
    if cfg!(debug_assertions) {
        ACTIVE_ARENAS.with(|count| count.set(count.get().saturating_sub(1)));
        RESERVED_BYTES.with(|bytes| bytes.set(bytes.get().saturating_sub(capacity)));
    }
}
