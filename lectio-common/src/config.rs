//! Configuration file discovery and TOML loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`~/.config/lectio/config.toml` on Linux)
//! 4. System config file (`/etc/lectio/config.toml`, Linux only)
//! 5. No file: callers fall back to compiled defaults
//!
//! A missing config file never aborts startup; it is logged and defaults apply.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name under the platform config directory
pub const APP_DIR_NAME: &str = "lectio";

/// Config file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LECTIO_CONFIG";

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where a resolved config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfigDir,
    SystemConfig,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CommandLine => write!(f, "command line"),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::UserConfigDir => write!(f, "user config dir"),
            ConfigSource::SystemConfig => write!(f, "system config"),
        }
    }
}

/// Resolve the config file path
///
/// Explicit paths (CLI, environment) are returned even if the file does not
/// exist, so that a typo surfaces as a load error instead of silently using
/// defaults. Implicit locations are only returned when the file exists.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Option<(PathBuf, ConfigSource)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigSource::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), ConfigSource::Environment));
        }
    }

    // Priority 3: User config directory
    if let Some(path) = user_config_path() {
        if path.exists() {
            return Some((path, ConfigSource::UserConfigDir));
        }
    }

    // Priority 4: System config file
    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc").join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if system.exists() {
            return Some((system, ConfigSource::SystemConfig));
        }
    }

    None
}

/// Default per-user config file location for the platform
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Read and decode a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value = toml::from_str(&content)?;
    Ok(value)
}

/// Resolve the config path and load it, or fall back to `T::default()`
///
/// Returns the loaded value plus the path it came from (None for defaults).
pub fn load_config_or_default<T>(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Result<(T, Option<PathBuf>)>
where
    T: DeserializeOwned + Default,
{
    match resolve_config_path(cli_arg, env_var_name) {
        Some((path, source)) => {
            let value = load_toml(&path)?;
            info!("Loaded configuration from {} ({})", path.display(), source);
            Ok((value, Some(path)))
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok((T::default(), None))
        }
    }
}

/// Parse a boolean environment variable ("1", "true", "yes", "on")
///
/// Returns None when the variable is unset or unrecognized.
pub fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("Ignoring {}={:?}: expected a boolean", name, other);
            None
        }
    }
}
