//! Configuration layering tests: file < environment < CLI
//!
//! Note: Uses serial_test to prevent ENV variable race conditions. Tests
//! that touch LECTIO_STRICT or LECTIO_OVERRIDES are marked #[serial].

use lectio_rr::config::{CliOverrides, OVERRIDES_ENV_VAR, STRICT_ENV_VAR};
use lectio_rr::{AppConfig, ResolveError, Resolver};
use serial_test::serial;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    std::env::remove_var(STRICT_ENV_VAR);
    std::env::remove_var(OVERRIDES_ENV_VAR);
}

fn cli(config: &Path) -> CliOverrides {
    CliOverrides {
        config_path: Some(config.to_path_buf()),
        ..CliOverrides::default()
    }
}

// ============================================================================
// File layer
// ============================================================================

#[test]
#[serial]
fn test_file_values_loaded() {
    clear_env();
    let file = write_file(
        "[logging]\nlevel = \"debug\"\n\n[resolver]\nmin_agreement = 3\n\n[http]\nmax_retries = 1\n",
    );

    let config = AppConfig::load(&cli(file.path())).unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.resolver.min_agreement, 3);
    assert_eq!(config.http.max_retries, 1);
    assert_eq!(config.providers.len(), 3);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    clear_env();
    let result = AppConfig::load(&cli(Path::new("/nonexistent/lectio/config.toml")));
    assert!(matches!(result, Err(ResolveError::Common(_))));
}

#[test]
#[serial]
fn test_invalid_file_values_rejected() {
    clear_env();
    let file = write_file("[resolver]\nadapter_timeout_secs = 0\n");
    assert!(matches!(
        AppConfig::load(&cli(file.path())),
        Err(ResolveError::Config(_))
    ));
}

// ============================================================================
// Environment layer
// ============================================================================

#[test]
#[serial]
fn test_env_strict_overrides_file() {
    clear_env();
    let file = write_file("[resolver]\nstrict = true\n");
    std::env::set_var(STRICT_ENV_VAR, "off");

    let config = AppConfig::load(&cli(file.path())).unwrap();
    clear_env();

    assert!(!config.resolver.strict);
}

#[test]
#[serial]
fn test_unrecognized_env_flag_ignored() {
    clear_env();
    let file = write_file("[resolver]\nstrict = true\n");
    std::env::set_var(STRICT_ENV_VAR, "sometimes");

    let config = AppConfig::load(&cli(file.path())).unwrap();
    clear_env();

    assert!(config.resolver.strict);
}

#[test]
#[serial]
fn test_env_overrides_path() {
    clear_env();
    let file = write_file("");
    std::env::set_var(OVERRIDES_ENV_VAR, "/srv/lectio/overrides.json");

    let config = AppConfig::load(&cli(file.path())).unwrap();
    clear_env();

    assert_eq!(
        config.overrides_path(),
        Some(Path::new("/srv/lectio/overrides.json"))
    );
}

// ============================================================================
// CLI layer
// ============================================================================

#[test]
#[serial]
fn test_cli_wins_over_env() {
    clear_env();
    let file = write_file("");
    std::env::set_var(STRICT_ENV_VAR, "0");
    std::env::set_var(OVERRIDES_ENV_VAR, "/from/env.json");

    let config = AppConfig::load(&CliOverrides {
        config_path: Some(file.path().to_path_buf()),
        strict: true,
        overrides_path: Some(PathBuf::from("/from/cli.json")),
    })
    .unwrap();
    clear_env();

    assert!(config.resolver.strict);
    assert_eq!(config.overrides_path(), Some(Path::new("/from/cli.json")));
}

// ============================================================================
// Resolver construction
// ============================================================================

#[test]
#[serial]
fn test_resolver_loads_override_file() {
    clear_env();
    let overrides = write_file(r#"{"2025-09-07": {"gospelRef": "John 11:1-45"}}"#);
    let mut config = AppConfig::default();
    config.resolver.overrides_path = Some(overrides.path().to_path_buf());

    let resolver = Resolver::from_config(&config).unwrap();

    assert_eq!(resolver.adapter_count(), 3);
}

#[test]
#[serial]
fn test_resolver_rejects_bad_override_file() {
    clear_env();
    let overrides = write_file("[1, 2");
    let mut config = AppConfig::default();
    config.resolver.overrides_path = Some(overrides.path().to_path_buf());

    assert!(matches!(
        Resolver::from_config(&config),
        Err(ResolveError::Overrides(_))
    ));
}
