//! Signature record persistence
//!
//! Reads are tolerant: a missing, unreadable or empty record is reported as
//! absent so a damaged cache degrades to a miss instead of failing the build.
//! Writes surface their errors.

use crate::cache::fingerprint::Fingerprint;
use crate::cache::layout::CacheLayout;
use crate::error::{DepcacheError, DepcacheResult};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Read the fingerprint stored by the last successful save
pub fn read_signature(cache_root: &Path) -> Option<Fingerprint> {
    let path = CacheLayout::new(cache_root).signature_path();

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No signature record at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Ignoring unreadable signature {}: {}", path.display(), e);
            return None;
        }
    };

    let value = content.trim_end_matches(['\n', '\r']);
    if value.trim().is_empty() {
        warn!("Ignoring empty signature {}", path.display());
        return None;
    }

    Some(Fingerprint::from_stored(value))
}

/// Replace the stored fingerprint
pub fn write_signature(cache_root: &Path, fingerprint: &Fingerprint) -> DepcacheResult<()> {
    let path = CacheLayout::new(cache_root).signature_path();
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{}\n", fingerprint))
    };

    write().map_err(|source| DepcacheError::SignatureWrite {
        path: path.clone(),
        source,
    })?;

    debug!("Wrote signature {} to {}", fingerprint.short_id(), path.display());
    Ok(())
}

/// Read the directory set recorded by the last save
pub fn read_manifest(cache_root: &Path) -> Option<Vec<String>> {
    let path = CacheLayout::new(cache_root).manifest_path();
    let content = fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&content) {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!("Ignoring corrupt directory manifest {}: {}", path.display(), e);
            None
        }
    }
}

/// Record the directory set used by this save
pub fn write_manifest(cache_root: &Path, directories: &[String]) -> DepcacheResult<()> {
    let path = CacheLayout::new(cache_root).manifest_path();
    let content = serde_json::to_string_pretty(directories)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DepcacheError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::write(&path, content)
        .map_err(|e| DepcacheError::io(format!("writing manifest {}", path.display()), e))
}
