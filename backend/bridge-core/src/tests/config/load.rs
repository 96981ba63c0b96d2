// Unit tests for config file loading and validation

use crate::config::{BridgeConfig, PollPolicy, resolve_config_path};
use crate::error::config::ConfigError;

use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// **VALUE**: Running without a config file uses the documented defaults.
///
/// **WHY THIS MATTERS**: The mixer's OSC pages and the host script are set up
/// for ports 9000/8000 and the `/tmp` files; defaults must match them.
#[test]
fn given_missing_file_when_loaded_then_defaults() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();

    // WHEN
    let config = BridgeConfig::load(&dir.path().join("absent.toml")).unwrap();

    // THEN
    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.web.bind_address(), "0.0.0.0:3000");
    assert_eq!(config.web.path, "/osc");
    assert_eq!(config.control_surface.remote_address(), "127.0.0.1:9000");
    assert_eq!(config.control_surface.listen_address(), "0.0.0.0:8000");
    assert_eq!(config.ipc.command_file, PathBuf::from("/tmp/fx_commands.txt"));
    assert_eq!(config.ipc.response_file, PathBuf::from("/tmp/fx_response.txt"));
    assert_eq!(config.ipc.bypass, PollPolicy::new(50, 10));
    assert_eq!(config.ipc.full_read, PollPolicy::new(50, 20));
    assert_eq!(config.refresh.track_count, 32);
}

/// **VALUE**: Partial files override only what they name.
#[test]
fn given_partial_toml_when_loaded_then_rest_defaulted() {
    // GIVEN
    let (_dir, path) = write_config(
        r#"
log_level = "debug"

[web]
port = 3100

[ipc.full_read]
max_attempts = 40

[refresh]
track_count = 8
"#,
    );

    // WHEN
    let config = BridgeConfig::load(&path).unwrap();

    // THEN
    assert_eq!(config.web.port, 3100);
    assert_eq!(config.web.path, "/osc");
    assert_eq!(config.ipc.full_read, PollPolicy::new(50, 40));
    assert_eq!(config.ipc.full_read.budget(), Duration::from_secs(2));
    assert_eq!(config.refresh.track_count, 8);
    assert_eq!(config.level_filter(), Some(LevelFilter::Debug));
}

/// **VALUE**: Broken TOML is an error naming the file, not silent defaults.
#[test]
fn given_invalid_toml_when_loaded_then_parse_error() {
    let (_dir, path) = write_config("[web\nport = ");

    let result = BridgeConfig::load(&path);

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Values that would make the bridge misbehave are rejected at load.
///
/// **BUG THIS CATCHES**: Would catch a zero attempt budget (every request times
/// out instantly) or a shared command/response file (the host reads its own
/// answers as commands) slipping through.
#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    let cases: Vec<(&str, Box<dyn Fn(&mut BridgeConfig)>)> = vec![
        ("path", Box::new(|c: &mut BridgeConfig| c.web.path = "osc".to_string())),
        ("client_buffer", Box::new(|c: &mut BridgeConfig| c.web.client_buffer = 0)),
        ("control_surface.port", Box::new(|c: &mut BridgeConfig| c.control_surface.port = 0)),
        ("control_surface.host", Box::new(|c: &mut BridgeConfig| c.control_surface.host.clear())),
        ("must differ", Box::new(|c: &mut BridgeConfig| c.ipc.response_file = c.ipc.command_file.clone())),
        ("queue_capacity", Box::new(|c: &mut BridgeConfig| c.ipc.queue_capacity = 0)),
        ("ipc.bypass", Box::new(|c: &mut BridgeConfig| c.ipc.bypass.max_attempts = 0)),
        ("ipc.sends_read", Box::new(|c: &mut BridgeConfig| c.ipc.sends_read.interval_ms = 0)),
        ("track_count", Box::new(|c: &mut BridgeConfig| c.refresh.track_count = 0)),
        ("track_count", Box::new(|c: &mut BridgeConfig| c.refresh.track_count = 5000)),
        ("log_level", Box::new(|c: &mut BridgeConfig| c.log_level = Some("loud".to_string()))),
    ];

    for (expected, mutate) in cases {
        let mut config = BridgeConfig::default();
        mutate(&mut config);

        match config.validate() {
            Err(ConfigError::ValidationError { reason, .. }) => {
                assert!(reason.contains(expected), "{expected}: got {reason}");
            }
            other => panic!("{expected}: expected ValidationError, got {other:?}"),
        }
    }
}

/// **VALUE**: Port 0 for local listeners is allowed (OS-assigned).
#[test]
fn given_zero_local_ports_when_validated_then_ok() {
    let mut config = BridgeConfig::default();
    config.web.port = 0;
    config.control_surface.listen_port = 0;

    assert!(config.validate().is_ok());
}

/// **VALUE**: An explicit path always wins.
#[test]
fn given_explicit_path_when_resolved_then_used() {
    let explicit = PathBuf::from("/etc/mixer-bridge/custom.toml");

    assert_eq!(resolve_config_path(Some(explicit.clone())), explicit);
}
