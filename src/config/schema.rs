//! Configuration schema for depcache
//!
//! Global configuration is stored at `~/.config/depcache/config.toml`; a
//! project may add a `.depcache.toml` next to its sources.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// How to detect the toolchain identity
    pub toolchain: ToolchainConfig,

    /// Metrics output
    pub metrics: MetricsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable dependency caching (default: true). Unrecognized values keep
    /// caching enabled.
    #[serde(deserialize_with = "lenient_flag")]
    pub enabled: bool,

    /// Cache root directory (default: user cache dir)
    pub root: Option<PathBuf>,

    /// Directories to cache instead of the default set
    pub directories: Option<Vec<String>>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: None,
            directories: None,
        }
    }
}

/// Accept a bool, an integer or a string, falling back to enabled
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
        Flag::Text(value) => super::parse_cache_flag(&value),
    })
}

/// Toolchain detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Platform image identifier; `STACK` is consulted when unset
    pub platform: Option<String>,

    /// Command printing the runtime version
    pub runtime_version_command: Vec<String>,

    /// Package manager name, part of the fingerprint
    pub package_manager: String,

    /// Command printing the package manager version
    pub package_manager_version_command: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            platform: None,
            runtime_version_command: vec!["node".to_string(), "--version".to_string()],
            package_manager: "npm".to_string(),
            package_manager_version_command: vec!["npm".to_string(), "--version".to_string()],
        }
    }
}

/// Metrics settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Append metrics as JSON lines
    pub enabled: bool,

    /// Metrics file (default: state dir)
    pub path: Option<PathBuf>,
}
