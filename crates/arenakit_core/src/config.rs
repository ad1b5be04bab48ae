//! # Arena Configuration
//!
//! Sizing for the arenas an application keeps alive, loaded once at startup
//! from TOML:
//!
//! ```toml
//! [global]
//! capacity = 4194304
//! clear_to_zero = true
//!
//! [transient]
//! capacity = 262144
//! no_log = true
//! ```
//!
//! Missing sections and keys fall back to [`MemoryConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ConfigError};
use crate::memory::{Arena, ArenaFlags, ARENA_BLOCK_ALIGN};

/// Default capacity of the long-lived arena (1 MiB).
pub const DEFAULT_GLOBAL_CAPACITY: usize = 1024 * 1024;

/// Default capacity of the per-frame arena (64 KiB).
pub const DEFAULT_TRANSIENT_CAPACITY: usize = 64 * 1024;

/// Construction parameters for one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Capacity of the first block in bytes.
    pub capacity: usize,
    /// Maps to [`ArenaFlags::CLEAR_TO_ZERO`].
    pub clear_to_zero: bool,
    /// Maps to [`ArenaFlags::NO_LOG`].
    pub no_log: bool,
}

impl ArenaConfig {
    /// Creates a config with the given capacity, clearing to zero and logging.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            clear_to_zero: true,
            no_log: false,
        }
    }

    /// Returns the arena flags this config selects.
    #[must_use]
    pub fn flags(&self) -> ArenaFlags {
        let mut flags = ArenaFlags::NONE;
        if self.clear_to_zero {
            flags |= ArenaFlags::CLEAR_TO_ZERO;
        }
        if self.no_log {
            flags |= ArenaFlags::NO_LOG;
        }
        flags
    }

    /// Checks that an arena can be built from this config.
    ///
    /// # Errors
    ///
    /// Returns the [`ArenaError`] that [`Arena::try_new`] would report.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        if self.capacity > isize::MAX as usize - (ARENA_BLOCK_ALIGN - 1) {
            return Err(ArenaError::CapacityOverflow {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Builds an arena from this config.
    ///
    /// # Errors
    ///
    /// Returns an [`ArenaError`] if the capacity is unusable.
    pub fn try_build(&self) -> Result<Arena, ArenaError> {
        Arena::try_new(self.capacity, self.flags())
    }

    /// Builds an arena from this config.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is unusable; call [`ArenaConfig::validate`]
    /// first for untrusted input.
    #[must_use]
    pub fn build(&self) -> Arena {
        Arena::new(self.capacity, self.flags())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRANSIENT_CAPACITY)
    }
}

/// The arena layout of an application: one long-lived arena and one cleared
/// every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    /// Arena for data that lives as long as the application.
    pub global: ArenaConfig,
    /// Arena reset at the end of every frame.
    pub transient: ArenaConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            global: ArenaConfig::with_capacity(DEFAULT_GLOBAL_CAPACITY),
            transient: ArenaConfig::with_capacity(DEFAULT_TRANSIENT_CAPACITY),
        }
    }
}

impl MemoryConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::InvalidArena`] for unusable capacities.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`MemoryConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Checks both arena sections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArena`] naming the first bad section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.global
            .validate()
            .map_err(|source| ConfigError::InvalidArena { arena: "global", source })?;
        self.transient
            .validate()
            .map_err(|source| ConfigError::InvalidArena { arena: "transient", source })?;
        Ok(())
    }

    /// Builds both arenas.
    ///
    /// # Panics
    ///
    /// Panics if either capacity is unusable; configs from
    /// [`MemoryConfig::from_toml_str`] are already validated.
    #[must_use]
    pub fn build(&self) -> FrameArenas {
        FrameArenas {
            global: self.global.build(),
            transient: self.transient.build(),
        }
    }
}

/// A global arena plus a transient arena that is reset every frame.
#[derive(Debug)]
pub struct FrameArenas {
    /// Long-lived allocations.
    pub global: Arena,
    /// Per-frame scratch allocations.
    pub transient: Arena,
}

impl FrameArenas {
    /// Resets the transient arena, keeping its blocks for the next frame.
    pub fn end_frame(&mut self) {
        self.transient.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MemoryConfig::from_toml_str("").unwrap();
        assert_eq!(config, MemoryConfig::default());
        assert_eq!(config.global.capacity, DEFAULT_GLOBAL_CAPACITY);
        assert!(config.transient.clear_to_zero);
    }

    #[test]
    fn test_config_partial_sections() {
        let config = MemoryConfig::from_toml_str(
            r"
            [transient]
            capacity = 4096
            no_log = true
            ",
        )
        .unwrap();

        assert_eq!(config.global, MemoryConfig::default().global);
        assert_eq!(config.transient.capacity, 4096);
        assert_eq!(
            config.transient.flags(),
            ArenaFlags::CLEAR_TO_ZERO | ArenaFlags::NO_LOG
        );
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let err = MemoryConfig::from_toml_str("[global]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidArena {
                arena: "global",
                source: ArenaError::ZeroCapacity
            }
        ));
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let err = MemoryConfig::from_toml_str("[global]\nsize = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = MemoryConfig {
            global: ArenaConfig::with_capacity(8192),
            transient: ArenaConfig {
                capacity: 512,
                clear_to_zero: false,
                no_log: true,
            },
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(MemoryConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_frame_arenas_end_frame() {
        let config = MemoryConfig {
            global: ArenaConfig::with_capacity(128),
            transient: ArenaConfig::with_capacity(64),
        };
        let mut arenas = config.build();
        let _ = arenas.global.alloc(32, 8);
        let _ = arenas.transient.alloc(48, 8);

        arenas.end_frame();
        assert_eq!(arenas.transient.offset(), 0);
        assert_eq!(arenas.global.offset(), 32);
    }
}
