//! # Config Loading Tests
//!
//! Loading arena sizing from disk and driving a frame loop with the result.

use std::fs;
use std::path::PathBuf;

use arenakit_core::{ArenaFlags, Array, ConfigError, MemoryConfig, Text};

fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("arenakit-{}-{name}.toml", std::process::id()));
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn test_load_config_from_file() {
    let path = temp_config(
        "full",
        r"
        [global]
        capacity = 8192
        clear_to_zero = true

        [transient]
        capacity = 1024
        clear_to_zero = false
        no_log = true
        ",
    );

    let config = MemoryConfig::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(config.global.capacity, 8192);
    assert_eq!(config.global.flags(), ArenaFlags::CLEAR_TO_ZERO);
    assert_eq!(config.transient.flags(), ArenaFlags::NO_LOG);
}

#[test]
fn test_missing_file_reports_path() {
    let path = std::env::temp_dir().join("arenakit-definitely-missing.toml");
    let err = MemoryConfig::load(&path).unwrap_err();

    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other}"),
    }
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let path = temp_config("broken", "[global\ncapacity = ");
    let err = MemoryConfig::load(&path).unwrap_err();
    fs::remove_file(&path).ok();

    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("invalid config syntax"));
}

#[test]
fn test_frame_loop_reuses_transient_blocks() {
    let config = MemoryConfig::from_toml_str(
        r"
        [global]
        capacity = 4096
        no_log = true

        [transient]
        capacity = 256
        no_log = true
        ",
    )
    .unwrap();
    let mut arenas = config.build();

    let mut first_frame_addr = None;
    for frame in 0..4u32 {
        {
            let mut scratch = Text::new(&arenas.transient);
            scratch.append("frame ").append(frame);
            let mut ids: Array<'_, u32> = Array::new(&arenas.transient);
            ids.extend(0..frame * 100);

            let addr = scratch.as_bytes().as_ptr() as usize;
            assert_eq!(*first_frame_addr.get_or_insert(addr), addr);
        }
        arenas.end_frame();
        assert_eq!(arenas.transient.total_used(), 0);
    }

    // Frame 3 needed 1200 bytes of ids, so the transient arena chained.
    assert!(arenas.transient.chain_len() > 1);
    assert_eq!(arenas.global.offset(), 0);
}
