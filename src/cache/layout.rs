//! On-disk layout of a cache root
//!
//! ```text
//! <cache_root>/
//!   v1/
//!     signature          fingerprint of the last successful save
//!     directories.json   directory set used by the last save
//!     dirs/<path>        one subtree per cached directory
//! ```
//!
//! Everything lives under a versioned prefix so an older layout never
//! collides with a newer one.

use std::path::{Path, PathBuf};

/// Layout version, also the leading tag of every fingerprint
pub const LAYOUT_VERSION: &str = "v1";

const SIGNATURE_FILE: &str = "signature";
const MANIFEST_FILE: &str = "directories.json";
const DIRS: &str = "dirs";

/// Paths inside a cache root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Layout rooted at `cache_root`
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            root: cache_root.into(),
        }
    }

    /// The cache root itself
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Versioned directory holding all state written by this layout
    pub fn base(&self) -> PathBuf {
        self.root.join(LAYOUT_VERSION)
    }

    /// Signature record path
    pub fn signature_path(&self) -> PathBuf {
        self.base().join(SIGNATURE_FILE)
    }

    /// Directory manifest path
    pub fn manifest_path(&self) -> PathBuf {
        self.base().join(MANIFEST_FILE)
    }

    /// Parent of every cached subtree
    pub fn dirs_root(&self) -> PathBuf {
        self.base().join(DIRS)
    }

    /// Where the cached copy of a relative directory lives
    pub fn cached_dir(&self, relative: &Path) -> PathBuf {
        self.dirs_root().join(relative)
    }
}
