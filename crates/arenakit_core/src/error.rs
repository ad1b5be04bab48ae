//! # Error Types
//!
//! Recoverable errors for the surfaces around the allocator core.
//!
//! The core itself has no recoverable errors: allocator exhaustion aborts and
//! invariant violations panic. What lives here is arena construction from
//! untrusted sizes, config loading, and text decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from fallible arena construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// An arena needs at least one byte of backing storage.
    #[error("arena capacity must be greater than zero")]
    ZeroCapacity,

    /// The requested capacity cannot be described as an allocation layout.
    #[error("arena capacity {capacity} exceeds the maximum allocation size")]
    CapacityOverflow {
        /// The rejected capacity in bytes.
        capacity: usize,
    },
}

/// Errors from loading or validating a [`crate::MemoryConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path of the file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid TOML for the expected schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered back to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed fine but cannot be used to build an arena.
    #[error("invalid config for arena `{arena}`: {source}")]
    InvalidArena {
        /// Which arena section was rejected.
        arena: &'static str,
        /// Why it was rejected.
        #[source]
        source: ArenaError,
    },
}

/// Errors from interpreting text bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The bytes are not valid UTF-8.
    #[error("text is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the longest valid prefix.
        valid_up_to: usize,
    },

    /// The text does not parse as the requested type.
    #[error("cannot parse {text:?} as {target}")]
    Parse {
        /// The text that failed to parse.
        text: String,
        /// Name of the target type.
        target: &'static str,
    },
}

/// Result type for text operations.
pub type TextResult<T> = Result<T, TextError>;
