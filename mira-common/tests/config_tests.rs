//! Tests for configuration loading and priority resolution
//!
//! Overrides (command line / environment) beat the TOML layer, which beats
//! compiled defaults. A missing default config file is not an error; a
//! missing explicitly named file is.

use mira_common::config::{
    load_toml_config, ConfigOverrides, ReviewConfig, TomlConfig, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_PORT,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_defaults_when_nothing_configured() {
    let config = ReviewConfig::resolve(ConfigOverrides::default(), TomlConfig::default()).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(config.allowed_extensions, vec!["xlsx", "xls", "csv"]);
    assert_eq!(config.sheet_cache_ttl, Duration::from_secs(300));
    assert_eq!(config.log_level, "info");
    assert!(config.uses_default_secret());
    assert_eq!(config.sync_target(), None);
}

#[test]
fn test_toml_overrides_defaults() {
    let toml = TomlConfig {
        port: Some(6000),
        sheets_url: Some("https://docs.google.com/spreadsheets/d/abc/edit".to_string()),
        ..Default::default()
    };

    let config = ReviewConfig::resolve(ConfigOverrides::default(), toml).unwrap();

    assert_eq!(config.port, 6000);
    assert!(config.sheets_url.is_some());
    // Sync needs credentials too
    assert_eq!(config.sync_target(), None);
}

#[test]
fn test_overrides_beat_toml() {
    let toml = TomlConfig {
        port: Some(6000),
        host: Some("0.0.0.0".to_string()),
        ..Default::default()
    };
    let overrides = ConfigOverrides {
        port: Some(7000),
        ..Default::default()
    };

    let config = ReviewConfig::resolve(overrides, toml).unwrap();

    assert_eq!(config.port, 7000);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.bind_address(), "0.0.0.0:7000");
}

#[test]
fn test_sync_enabled_with_url_and_credentials() {
    let overrides = ConfigOverrides {
        sheets_url: Some("https://docs.google.com/spreadsheets/d/abc/edit".to_string()),
        credentials_file: Some(PathBuf::from("/etc/mira/token.json")),
        ..Default::default()
    };

    let config = ReviewConfig::resolve(overrides, TomlConfig::default()).unwrap();
    assert_eq!(
        config.sync_target(),
        Some((
            "https://docs.google.com/spreadsheets/d/abc/edit",
            Path::new("/etc/mira/token.json")
        ))
    );
}

#[test]
fn test_blank_sheets_url_disables_sync() {
    let overrides = ConfigOverrides {
        sheets_url: Some("  ".to_string()),
        credentials_file: Some(PathBuf::from("token.json")),
        ..Default::default()
    };

    let config = ReviewConfig::resolve(overrides, TomlConfig::default()).unwrap();
    assert_eq!(config.sync_target(), None);
}

#[test]
fn test_invalid_values_rejected() {
    let zero_port = ConfigOverrides { port: Some(0), ..Default::default() };
    assert!(ReviewConfig::resolve(zero_port, TomlConfig::default()).is_err());

    let no_extensions = ConfigOverrides {
        allowed_extensions: Some(vec![" ".to_string()]),
        ..Default::default()
    };
    assert!(ReviewConfig::resolve(no_extensions, TomlConfig::default()).is_err());
}

#[test]
fn test_extension_check_is_case_insensitive() {
    let overrides = ConfigOverrides {
        allowed_extensions: Some(vec![".CSV".to_string()]),
        ..Default::default()
    };
    let config = ReviewConfig::resolve(overrides, TomlConfig::default()).unwrap();

    assert!(config.is_allowed_extension("export.Csv"));
    assert!(!config.is_allowed_extension("export.xlsx"));
    assert!(!config.is_allowed_extension("csv"));
}

#[test]
fn test_load_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
port = 5999
secret_key = "from-file"
allowed_extensions = ["csv"]
sheet_cache_ttl_secs = 60

[logging]
level = "debug"
"#
    )
    .unwrap();

    let toml = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(toml.source.as_deref(), Some(file.path()));
    assert_eq!(toml.secret_source(), Some(file.path()));
    let config = ReviewConfig::resolve(ConfigOverrides::default(), toml).unwrap();

    assert_eq!(config.port, 5999);
    assert_eq!(config.secret_key, "from-file");
    assert_eq!(config.allowed_extensions, vec!["csv"]);
    assert_eq!(config.sheet_cache_ttl, Duration::from_secs(60));
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_file_without_secret_has_no_secret_source() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port = 5998").unwrap();

    let toml = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(toml.source.as_deref(), Some(file.path()));
    assert_eq!(toml.secret_source(), None);
}

#[test]
fn test_explicit_missing_file_is_error() {
    let result = load_toml_config(Some(std::path::Path::new("/nonexistent/mira/config.toml")));
    assert!(result.is_err());
}

#[test]
fn test_malformed_toml_is_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    assert!(load_toml_config(Some(file.path())).is_err());
}
