//! Toolchain fingerprints
//!
//! A fingerprint identifies the runtime, package manager and platform image
//! a cache was built with. Two fingerprints match only when every component
//! is byte-for-byte equal.

use crate::cache::layout::LAYOUT_VERSION;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Placeholder for a version that could not be detected
pub const UNKNOWN: &str = "unknown";

/// Resolved identity of the active toolchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainIdentity {
    /// OS / platform image identifier (e.g. "heroku-22")
    pub platform_image: String,
    /// Runtime version (e.g. "v20.11.0")
    pub runtime_version: String,
    /// Package manager name (e.g. "npm")
    pub package_manager_name: String,
    /// Package manager version (e.g. "10.2.4")
    pub package_manager_version: String,
}

impl ToolchainIdentity {
    /// Build an identity, substituting [`UNKNOWN`] for blank components
    pub fn new(
        platform_image: impl Into<String>,
        runtime_version: impl Into<String>,
        package_manager_name: impl Into<String>,
        package_manager_version: impl Into<String>,
    ) -> Self {
        Self {
            platform_image: or_unknown(platform_image.into()),
            runtime_version: or_unknown(runtime_version.into()),
            package_manager_name: or_unknown(package_manager_name.into()),
            package_manager_version: or_unknown(package_manager_version.into()),
        }
    }

    fn components(&self) -> [&str; 4] {
        [
            self.platform_image.as_str(),
            self.runtime_version.as_str(),
            self.package_manager_name.as_str(),
            self.package_manager_version.as_str(),
        ]
    }
}

fn or_unknown(value: String) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}

/// Opaque signature of a toolchain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a stored fingerprint string as-is
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether every component was detected.
    ///
    /// An unresolved fingerprint never validates a cache.
    pub fn is_resolved(&self) -> bool {
        !self
            .0
            .split(';')
            .flat_map(str::split_whitespace)
            .any(|part| part == UNKNOWN)
    }

    /// First 12 hex chars of the SHA256 of the fingerprint, for display only
    pub fn short_id(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the fingerprint for a toolchain identity.
///
/// Pure: the same identity always yields the same fingerprint.
pub fn compute_fingerprint(identity: &ToolchainIdentity) -> Fingerprint {
    let [platform, runtime, pm_name, pm_version] = identity.components();
    Fingerprint(format!(
        "{}; {}; {}; {} {}",
        LAYOUT_VERSION, platform, runtime, pm_name, pm_version
    ))
}
