//! Cache status resolution

use crate::cache::directories::CacheDirectorySet;
use crate::cache::fingerprint::Fingerprint;
use crate::cache::signature::{read_manifest, read_signature};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Whether, and why, the cache can be reused this build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStatus {
    /// Caching explicitly turned off
    Disabled,
    /// Nothing was ever saved
    NoCache,
    /// A cache exists but was built with a different toolchain or directory set
    NewSignature,
    /// The cache matches and will be restored
    Valid,
}

impl CacheStatus {
    /// Whether directories should be restored
    pub fn should_restore(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Label used in notices and metric names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NoCache => "no-cache",
            Self::NewSignature => "new-signature",
            Self::Valid => "valid",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the cache. First match wins:
/// disabled, then no stored signature, then mismatch, then valid.
pub fn resolve(cache_root: &Path, computed: &Fingerprint, cache_enabled: bool) -> CacheStatus {
    if !cache_enabled {
        return CacheStatus::Disabled;
    }

    let Some(stored) = read_signature(cache_root) else {
        return CacheStatus::NoCache;
    };

    if stored != *computed {
        debug!("Signature changed: stored {:?}, computed {:?}", stored.as_str(), computed.as_str());
        return CacheStatus::NewSignature;
    }

    CacheStatus::Valid
}

/// [`resolve`], additionally treating an unresolved fingerprint or a changed
/// directory set as a new signature
pub fn resolve_for_set(
    cache_root: &Path,
    computed: &Fingerprint,
    cache_enabled: bool,
    directories: &CacheDirectorySet,
) -> CacheStatus {
    let status = resolve(cache_root, computed, cache_enabled);
    if status != CacheStatus::Valid {
        return status;
    }

    if !computed.is_resolved() {
        debug!("Toolchain version unknown, not reusing cache");
        return CacheStatus::NewSignature;
    }

    match read_manifest(cache_root) {
        Some(stored) if stored.as_slice() == directories.as_slice() => CacheStatus::Valid,
        Some(stored) => {
            debug!(
                "Directory set changed: stored {:?}, current {:?}",
                stored,
                directories.as_slice()
            );
            CacheStatus::NewSignature
        }
        None => {
            debug!("No directory manifest alongside signature");
            CacheStatus::NewSignature
        }
    }
}
