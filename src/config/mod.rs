//! Configuration management for depcache
//!
//! Precedence, lowest first: built-in defaults, global config file,
//! project-local `.depcache.toml`, environment, command-line flags.

pub mod schema;

pub use schema::Config;

use crate::cache::{CacheContext, CacheDirectorySet};
use crate::error::{DepcacheError, DepcacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = ".depcache.toml";

/// Environment keys read by [`apply_env`]
pub mod env {
    /// "false" disables caching; anything unparsable leaves it enabled
    pub const CACHE: &str = "DEPCACHE_CACHE";
    /// Comma or whitespace separated directory override
    pub const CACHE_DIRECTORIES: &str = "DEPCACHE_CACHE_DIRECTORIES";
    /// Cache root override
    pub const CACHE_ROOT: &str = "DEPCACHE_CACHE_ROOT";
    /// Platform image identifier
    pub const PLATFORM: &str = "DEPCACHE_PLATFORM";
    /// Conventional platform image variable on buildpack hosts
    pub const STACK: &str = "STACK";
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depcache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depcache")
    }

    /// Default metrics file
    pub fn metrics_path() -> PathBuf {
        Self::state_dir().join("metrics.jsonl")
    }

    /// Default cache root
    pub fn default_cache_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depcache")
    }

    /// Find the project-local config in `dir`
    pub fn find_local_config(dir: &Path) -> Option<PathBuf> {
        let path = dir.join(LOCAL_CONFIG_FILE);
        path.is_file().then_some(path)
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> DepcacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> DepcacheResult<Config> {
        let value = read_toml(path).await?;
        value.try_into().map_err(|e: toml::de::Error| DepcacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load the global config with a project-local file layered on top
    pub async fn load_merged(&self, local: Option<&Path>) -> DepcacheResult<Config> {
        let Some(local) = local else {
            return self.load().await;
        };

        let mut base = if self.config_path.exists() {
            read_toml(&self.config_path).await?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };
        merge_toml(&mut base, read_toml(local).await?);

        base.try_into().map_err(|e: toml::de::Error| DepcacheError::ConfigInvalid {
            path: local.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_toml(path: &Path) -> DepcacheResult<toml::Value> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| DepcacheError::io(format!("reading config from {}", path.display()), e))?;

    content
        .parse()
        .map_err(|e: toml::de::Error| DepcacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Overlay `overlay` onto `base`, recursing into tables
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Parse the cache enable flag. Unparsable values leave caching enabled.
pub fn parse_cache_flag(value: &str) -> bool {
    match value.trim().to_lowercase().as_str() {
        "false" | "0" | "no" | "off" => false,
        "true" | "1" | "yes" | "on" | "" => true,
        other => {
            warn!("Unrecognized cache flag {:?}, keeping cache enabled", other);
            true
        }
    }
}

/// Apply environment overrides using `lookup` to read variables
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(env::CACHE) {
        config.cache.enabled = parse_cache_flag(&value);
    }

    if let Some(value) = lookup(env::CACHE_DIRECTORIES) {
        let dirs = CacheDirectorySet::parse_list(&value);
        if !dirs.is_empty() {
            config.cache.directories = Some(dirs);
        }
    }

    if let Some(value) = lookup(env::CACHE_ROOT).filter(|v| !v.is_empty()) {
        config.cache.root = Some(PathBuf::from(value));
    }

    if let Some(value) = lookup(env::PLATFORM) {
        config.toolchain.platform = Some(value);
    } else if config.toolchain.platform.is_none() {
        config.toolchain.platform = lookup(env::STACK);
    }
}

/// Apply overrides from the process environment
pub fn apply_process_env(config: &mut Config) {
    apply_env(config, |key| std::env::var(key).ok());
}

impl Config {
    /// Resolved cache root
    pub fn cache_root(&self) -> PathBuf {
        self.cache
            .root
            .clone()
            .unwrap_or_else(ConfigManager::default_cache_root)
    }

    /// Resolved metrics file
    pub fn metrics_path(&self) -> PathBuf {
        self.metrics
            .path
            .clone()
            .unwrap_or_else(ConfigManager::metrics_path)
    }

    /// Build the coordinator context for a working directory
    pub fn cache_context(&self, working_root: &Path) -> DepcacheResult<CacheContext> {
        Ok(CacheContext {
            working_root: working_root.to_path_buf(),
            cache_root: self.cache_root(),
            directories: CacheDirectorySet::from_override(self.cache.directories.clone())?,
            enabled: self.cache.enabled,
        })
    }
}
