//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. The TOML config file (platform config dir, or `--config`)
//! 3. `APPSYNC_*` environment variables
//! 4. CLI flags ([`ConfigOverrides`])
//!
//! A missing or unreadable config file never stops the program; the
//! remaining layers still apply.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::entry::LanguagePlan;
use crate::icons::IconCacheLimits;

/// Prefix for environment overrides, e.g. `APPSYNC_INTER_ITEM_DELAY_MS=1000`.
pub const ENV_PREFIX: &str = "APPSYNC_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store file. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Search index file. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_index_path: Option<PathBuf>,
    /// Overrides the language detected from the locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub inter_item_delay_ms: u64,
    /// Per-call generator timeout; `0` waits forever.
    pub generator_timeout_secs: u64,
    /// Probed before the built-in generator locations.
    pub generator_paths: Vec<PathBuf>,
    pub icon_cache_max_items: usize,
    pub icon_cache_max_bytes: usize,
    pub icon_preload_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        let limits = IconCacheLimits::default();
        Self {
            store_path: None,
            search_index_path: None,
            language: None,
            inter_item_delay_ms: 500,
            generator_timeout_secs: 120,
            generator_paths: Vec::new(),
            icon_cache_max_items: limits.max_items,
            icon_cache_max_bytes: limits.max_bytes,
            icon_preload_concurrency: limits.max_concurrent_loads,
        }
    }
}

/// Values set on the command line. `None` leaves lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_item_delay_ms: Option<u64>,
}

impl Config {
    /// The full provider stack for `file` (or the default config path).
    #[must_use]
    pub fn figment(file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file.map(Path::to_path_buf).or_else(Self::config_path) {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Load the layered configuration.
    ///
    /// If the file layer is malformed it is dropped and the other layers are
    /// retried; if that fails too, the built-in defaults are used.
    #[must_use]
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Self {
        match Self::figment(file, overrides).extract() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, ignoring config file: {}", e);
                Figment::from(Serialized::defaults(Config::default()))
                    .merge(Env::prefixed(ENV_PREFIX))
                    .merge(Serialized::defaults(overrides))
                    .extract()
                    .unwrap_or_else(|e| {
                        log::debug!("Failed to apply overrides, using defaults: {}", e);
                        Self::default()
                    })
            }
        }
    }

    /// Write this configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to encode config as TOML")
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolved record store location.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("records.json")),
        }
    }

    /// Resolved search index location.
    pub fn search_index_path(&self) -> Result<PathBuf> {
        match &self.search_index_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("search-index.json")),
        }
    }

    #[must_use]
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }

    #[must_use]
    pub fn generator_timeout(&self) -> Option<Duration> {
        (self.generator_timeout_secs > 0).then(|| Duration::from_secs(self.generator_timeout_secs))
    }

    /// Icon cache limits; zero values fall back to the built-in defaults.
    #[must_use]
    pub fn icon_cache_limits(&self) -> IconCacheLimits {
        let defaults = IconCacheLimits::default();
        let or_default = |value: usize, fallback: usize| if value == 0 { fallback } else { value };
        IconCacheLimits {
            max_items: or_default(self.icon_cache_max_items, defaults.max_items),
            max_bytes: or_default(self.icon_cache_max_bytes, defaults.max_bytes),
            max_concurrent_loads: or_default(
                self.icon_preload_concurrency,
                defaults.max_concurrent_loads,
            ),
        }
    }

    /// Target languages: the configured language, else the locale's.
    #[must_use]
    pub fn language_plan(&self) -> LanguagePlan {
        match &self.language {
            Some(code) => LanguagePlan::new(code),
            None => LanguagePlan::detect(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "appsync", "appsync")
}

fn data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))
}
