//! Configuration for lectio-rr
//!
//! Resolution order: CLI flags > environment variables > TOML file > built-in
//! defaults. The TOML file itself is located by `lectio_common::config`.

use lectio_common::config::{env_flag, load_config_or_default, LoggingConfig, CONFIG_ENV_VAR};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{ResolveError, Result};

/// Environment variable forcing strict mode on or off
pub const STRICT_ENV_VAR: &str = "LECTIO_STRICT";

/// Environment variable naming the override file
pub const OVERRIDES_ENV_VAR: &str = "LECTIO_OVERRIDES";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.8";

/// Complete application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Providers in priority order (first = highest)
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            resolver: ResolverConfig::default(),
            http: HttpConfig::default(),
            providers: default_providers(),
        }
    }
}

/// `[resolver]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fail a date when first, psalm or gospel is empty after overrides
    pub strict: bool,
    /// Independent sources that must agree for a majority win
    pub min_agreement: usize,
    /// Upper bound on one adapter's fetch for one date
    pub adapter_timeout_secs: u64,
    /// Optional override file
    pub overrides_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict: false,
            min_agreement: 2,
            adapter_timeout_secs: 30,
            overrides_path: None,
        }
    }
}

impl ResolverConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}

/// `[http]` section, shared by every provider
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    /// Retries after the first attempt, for 429 and 5xx only
    pub max_retries: u32,
    /// Linear backoff unit: retry n waits n * retry_backoff_ms
    pub retry_backoff_ms: u64,
    pub requests_per_second: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout_secs: 20,
            max_retries: 4,
            retry_backoff_ms: 500,
            requests_per_second: 2,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_for(&self, retry: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(retry)))
    }
}

/// Provider page formats with a dedicated adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Usccb,
    Universalis,
    CatholicOrg,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Usccb => write!(f, "usccb"),
            ProviderKind::Universalis => write!(f, "universalis"),
            ProviderKind::CatholicOrg => write!(f, "catholic-org"),
        }
    }
}

/// One `[[providers]]` entry
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Source id reported in candidates and results
    pub id: String,
    pub kind: ProviderKind,
    /// URL with date placeholders ({MMDDYY}, {YYYYMMDD}, {ISO}, {YYYY}, {MM}, {DD})
    pub url_template: String,
    /// Tried once when the primary URL yields nothing
    #[serde(default)]
    pub alt_url_template: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Built-in provider list: USCCB first, then Universalis, then Catholic.org
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            id: "usccb".to_string(),
            kind: ProviderKind::Usccb,
            url_template: "https://bible.usccb.org/bible/readings/{MMDDYY}.cfm".to_string(),
            alt_url_template: Some(
                "https://bible.usccb.org/bible/readings?date={ISO}".to_string(),
            ),
            enabled: true,
        },
        ProviderConfig {
            id: "universalis".to_string(),
            kind: ProviderKind::Universalis,
            url_template: "https://universalis.com/{YYYYMMDD}/jsonpmass.js".to_string(),
            alt_url_template: None,
            enabled: true,
        },
        ProviderConfig {
            id: "catholic-org".to_string(),
            kind: ProviderKind::CatholicOrg,
            url_template: "https://www.catholic.org/bible/daily_reading/?select_date={ISO}"
                .to_string(),
            alt_url_template: None,
            enabled: true,
        },
    ]
}

/// Command-line values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub strict: bool,
    pub overrides_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load the TOML file (if any), then apply environment and CLI overrides
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let (mut config, path): (AppConfig, _) =
            load_config_or_default(cli.config_path.as_deref(), CONFIG_ENV_VAR)?;
        if let Some(path) = path {
            info!("Resolver configuration file: {}", path.display());
        }

        config.apply_env();
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Apply `LECTIO_STRICT` and `LECTIO_OVERRIDES`
    pub fn apply_env(&mut self) {
        if let Some(strict) = env_flag(STRICT_ENV_VAR) {
            info!("Strict mode {} from {}", strict, STRICT_ENV_VAR);
            self.resolver.strict = strict;
        }
        if let Ok(path) = std::env::var(OVERRIDES_ENV_VAR) {
            if !path.trim().is_empty() {
                info!("Override file from {}: {}", OVERRIDES_ENV_VAR, path);
                self.resolver.overrides_path = Some(PathBuf::from(path));
            }
        }
    }

    /// `--strict` can only turn strict mode on
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if cli.strict {
            self.resolver.strict = true;
        }
        if let Some(path) = &cli.overrides_path {
            self.resolver.overrides_path = Some(path.clone());
        }
    }

    /// Reject configurations the resolver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.resolver.min_agreement < 2 {
            return Err(ResolveError::Config(format!(
                "resolver.min_agreement must be at least 2 (got {})",
                self.resolver.min_agreement
            )));
        }
        if self.resolver.adapter_timeout_secs == 0 {
            return Err(ResolveError::Config(
                "resolver.adapter_timeout_secs must be positive".to_string(),
            ));
        }
        if self.http.requests_per_second == 0 {
            return Err(ResolveError::Config(
                "http.requests_per_second must be positive".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(ResolveError::Config("provider id must not be empty".to_string()));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ResolveError::Config(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
        }
        Ok(())
    }

    /// Enabled providers in priority order
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Parse configuration from TOML text (no environment or CLI layers)
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text).map_err(lectio_common::Error::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn overrides_path(&self) -> Option<&Path> {
        self.resolver.overrides_path.as_deref()
    }
}
