//! The set of directories subject to caching

use crate::error::{DepcacheError, DepcacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Directories cached when the caller supplies no override
pub const DEFAULT_DIRECTORIES: &[&str] = &["node_modules"];

/// Where a directory set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySource {
    /// Built-in default set
    Default,
    /// Caller-supplied override
    Custom,
}

impl fmt::Display for DirectorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Ordered list of working-tree-relative directories.
///
/// Duplicates are kept as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectorySet {
    entries: Vec<String>,
    source: DirectorySource,
}

impl CacheDirectorySet {
    /// The built-in default set
    pub fn default_set() -> Self {
        Self {
            entries: DEFAULT_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
            source: DirectorySource::Default,
        }
    }

    /// A caller-supplied set. Every path must stay inside the working root.
    pub fn custom<I, S>(entries: I) -> DepcacheResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|e| normalize(e.into()))
            .collect::<DepcacheResult<Vec<_>>>()?;

        Ok(Self {
            entries,
            source: DirectorySource::Custom,
        })
    }

    /// Use `overrides` when present, otherwise the default set
    pub fn from_override(overrides: Option<Vec<String>>) -> DepcacheResult<Self> {
        match overrides {
            Some(list) if !list.is_empty() => Self::custom(list),
            _ => Ok(Self::default_set()),
        }
    }

    /// Parse an environment-style list separated by commas or whitespace
    pub fn parse_list(value: &str) -> Vec<String> {
        value
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn source(&self) -> DirectorySource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

/// Reject paths that would escape the working root or the cache root
fn normalize(raw: String) -> DepcacheResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: &str| DepcacheError::DirectoryInvalid {
        path: raw.clone(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("path is empty"));
    }

    let path = Path::new(trimmed);
    if path.is_absolute() {
        return Err(invalid("path must be relative"));
    }

    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"))
            }
        }
    }

    if path.components().all(|c| c == Component::CurDir) {
        return Err(invalid("path must name a directory below the working root"));
    }

    Ok(trimmed.to_string())
}
