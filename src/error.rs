//! Error types for depcache
//!
//! All modules use `DepcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for depcache operations
pub type DepcacheResult<T> = Result<T, DepcacheError>;

/// All errors that can occur in depcache
#[derive(Error, Debug)]
pub enum DepcacheError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid cache directory {path:?}: {reason}")]
    DirectoryInvalid { path: String, reason: String },

    // Cache errors
    #[error("Failed to {operation} cache directory {directory}: {source}")]
    Archive {
        operation: &'static str,
        directory: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache signature {path}: {source}")]
    SignatureWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clear cache root {path}: {source}")]
    CacheClear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache coordinator cannot {action} while {state}")]
    InvalidPhase { action: &'static str, state: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Install command exited with code {code}: {command}")]
    InstallFailed { command: String, code: i32 },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl DepcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an archive error for the directory that failed to copy
    pub fn archive(
        operation: &'static str,
        directory: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Archive {
            operation,
            directory: directory.into(),
            source,
        }
    }

    /// The cache directory this error is about, if any
    pub fn directory(&self) -> Option<&str> {
        match self {
            Self::Archive { directory, .. } => Some(directory),
            Self::DirectoryInvalid { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Archive { .. } | Self::CacheClear { .. } => {
                Some("Run: depcache clear -y, then rebuild to repopulate the cache")
            }
            Self::DirectoryInvalid { .. } => {
                Some("Cache directories must be relative paths inside the working directory")
            }
            Self::InstallFailed { .. } => Some("The cache was not saved because the install failed"),
            _ => None,
        }
    }
}
