//! Malformed configuration must fail loading rather than fall back silently.

use std::ffi::OsString;
use std::fs;

use ortho_config::OrthoConfig;
use tempfile::TempDir;
use turbolink_config::Config;

#[test]
fn malformed_config_file_fails_to_load() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let path = temp_dir.path().join("turbolink.toml");
    fs::write(&path, "tick_interval_ms = \"fast\"\n").expect("write malformed config");

    let args = vec![
        OsString::from("turbolink"),
        OsString::from("--config-path"),
        path.into_os_string(),
    ];

    let error = Config::load_from_iter(args).expect_err("loading must fail");
    assert!(
        !error.to_string().is_empty(),
        "expected a descriptive configuration error"
    );
}

#[test]
fn unknown_close_event_policy_is_rejected() {
    let args = vec![
        OsString::from("turbolink"),
        OsString::from("--close-event"),
        OsString::from("sometimes"),
    ];

    assert!(Config::load_from_iter(args).is_err());
}
