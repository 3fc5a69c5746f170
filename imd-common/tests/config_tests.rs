//! Integration tests for configuration resolution
//!
//! Covers:
//! - Priority order CLI → ENV → TOML → default for the backend URL
//! - Missing TOML files degrade to defaults instead of failing
//! - Malformed TOML and invalid URLs are reported as configuration errors
//!
//! Note: Uses serial_test to prevent ENV variable races. Tests that touch
//! IMD_API_BASE_URL are marked #[serial].

use imd_common::config::{ConfigResolver, API_BASE_URL_ENV, DEFAULT_API_BASE_URL};
use imd_common::Error;
use serial_test::serial;
use std::env;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_no_overrides_uses_default_url() {
    env::remove_var(API_BASE_URL_ENV);
    let dir = TempDir::new().unwrap();

    let config = ConfigResolver::new()
        .with_config_file(Some(dir.path().join("missing.toml")))
        .resolve()
        .unwrap();

    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.library_cache_ttl, Duration::from_secs(30 * 60));
}

#[test]
#[serial]
fn test_toml_url_used_when_no_env_or_cli() {
    env::remove_var(API_BASE_URL_ENV);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"api_base_url = "https://toml.example.com/api/v1/""#);

    let config = ConfigResolver::new()
        .with_config_file(Some(path))
        .resolve()
        .unwrap();

    assert_eq!(config.api_base_url, "https://toml.example.com/api/v1");
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"api_base_url = "https://toml.example.com""#);
    env::set_var(API_BASE_URL_ENV, "https://env.example.com");

    let config = ConfigResolver::new()
        .with_config_file(Some(path))
        .resolve()
        .unwrap();

    assert_eq!(config.api_base_url, "https://env.example.com");

    env::remove_var(API_BASE_URL_ENV);
}

#[test]
#[serial]
fn test_cli_overrides_env_and_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"api_base_url = "https://toml.example.com""#);
    env::set_var(API_BASE_URL_ENV, "https://env.example.com");

    let config = ConfigResolver::new()
        .with_cli_base_url(Some("http://cli.example.com:8000/api/v1".to_string()))
        .with_config_file(Some(path))
        .resolve()
        .unwrap();

    assert_eq!(config.api_base_url, "http://cli.example.com:8000/api/v1");

    env::remove_var(API_BASE_URL_ENV);
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    env::set_var(API_BASE_URL_ENV, "   ");
    let dir = TempDir::new().unwrap();

    let config = ConfigResolver::new()
        .with_config_file(Some(dir.path().join("missing.toml")))
        .resolve()
        .unwrap();

    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);

    env::remove_var(API_BASE_URL_ENV);
}

#[test]
#[serial]
fn test_malformed_toml_is_config_error() {
    env::remove_var(API_BASE_URL_ENV);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "api_base_url = [not valid");

    let result = ConfigResolver::new().with_config_file(Some(path)).resolve();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_invalid_scheme_is_config_error() {
    env::remove_var(API_BASE_URL_ENV);
    let dir = TempDir::new().unwrap();

    let result = ConfigResolver::new()
        .with_cli_base_url(Some("ftp://example.com".to_string()))
        .with_config_file(Some(dir.path().join("missing.toml")))
        .resolve();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_toml_sections_flow_into_client_config() {
    env::remove_var(API_BASE_URL_ENV);
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        [library]
        cache_ttl_secs = 120
        filter_limit = 50
        filter_debounce_ms = 150

        [search]
        suggestion_limit = 5
        suggestion_min_chars = 3
        suggestion_debounce_ms = 100

        [logging]
        level = "debug"
        file = "/tmp/imd.log"
        "#,
    );

    let config = ConfigResolver::new()
        .with_config_file(Some(path))
        .resolve()
        .unwrap();

    assert_eq!(config.library_cache_ttl, Duration::from_secs(120));
    assert_eq!(config.library_filter_limit, 50);
    assert_eq!(config.library_filter_debounce, Duration::from_millis(150));
    assert_eq!(config.suggestion_limit, 5);
    assert_eq!(config.suggestion_min_chars, 3);
    assert_eq!(config.suggestion_debounce, Duration::from_millis(100));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/imd.log"))
    );
}
