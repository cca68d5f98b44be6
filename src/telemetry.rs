//! Build metrics sinks
//!
//! The coordinator reports the resolved cache status as a counter and the
//! install phase duration as a timing. Transmission is someone else's job;
//! the file sink writes JSON lines a shipper can pick up.

use crate::cache::CacheStatus;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Receiver for cache metrics
pub trait MetricsSink {
    /// Increment a named counter
    fn increment(&self, counter: &str);

    /// Record a duration tagged with the cache status it ran under
    fn timing(&self, name: &str, elapsed: Duration, status: CacheStatus);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _counter: &str) {}

    fn timing(&self, _name: &str, _elapsed: Duration, _status: CacheStatus) {}
}

/// File-based sink that appends JSON lines
pub struct JsonLinesMetrics {
    enabled: bool,
    path: PathBuf,
}

impl JsonLinesMetrics {
    pub fn new(path: PathBuf, enabled: bool) -> Self {
        Self { enabled, path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Silently drops events on IO failure; metrics must never fail a build.
    fn emit(&self, entry: serde_json::Value) {
        if !self.enabled {
            return;
        }

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize metric: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line) {
            warn!("Failed to write metrics to {}: {}", self.path.display(), e);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl MetricsSink for JsonLinesMetrics {
    fn increment(&self, counter: &str) {
        self.emit(serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "kind": "count",
            "name": counter,
            "value": 1,
        }));
    }

    fn timing(&self, name: &str, elapsed: Duration, status: CacheStatus) {
        self.emit(serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "kind": "timing",
            "name": name,
            "value_ms": elapsed.as_millis() as u64,
            "cache_status": status,
        }));
    }
}
