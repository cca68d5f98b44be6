//! Restore and save sequencing for one build
//!
//! ```text
//! idle -> resolving -> restoring | skipping-restore -> awaiting-build
//!      -> saving -> idle
//! ```
//!
//! An archive failure in either copy phase moves the coordinator to
//! `failed`, after which it refuses to do anything else. Resolution itself
//! never fails.

use crate::cache::archive::{self, ArchiveReport};
use crate::cache::directories::CacheDirectorySet;
use crate::cache::fingerprint::{compute_fingerprint, Fingerprint, ToolchainIdentity};
use crate::cache::signature::{write_manifest, write_signature};
use crate::cache::status::{resolve_for_set, CacheStatus};
use crate::error::{DepcacheError, DepcacheResult};
use crate::telemetry::MetricsSink;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Metric name for the install phase duration
pub const INSTALL_TIME_METRIC: &str = "install-time";

/// Everything the coordinator needs to know about this build
#[derive(Debug, Clone)]
pub struct CacheContext {
    /// Build working directory; cached paths are relative to it
    pub working_root: PathBuf,
    /// Persistent cache directory, owned by this build
    pub cache_root: PathBuf,
    /// Directories to restore and save
    pub directories: CacheDirectorySet,
    /// False when caching was explicitly disabled
    pub enabled: bool,
}

/// Where the coordinator is in the build lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving,
    Restoring,
    SkippingRestore,
    AwaitingBuild,
    Saving,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Restoring => "restoring",
            Self::SkippingRestore => "skipping restore",
            Self::AwaitingBuild => "awaiting build",
            Self::Saving => "saving",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of the restore phase
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub status: CacheStatus,
    /// Per-directory copy results; empty when restore was skipped
    pub archive: ArchiveReport,
    /// Directories skipped because the cache is stale (`new-signature` only)
    pub not_restored: Vec<String>,
}

/// Outcome of the save phase
#[derive(Debug, Clone)]
pub enum SaveReport {
    /// Caching disabled: the cache root was cleared and nothing written
    Disabled,
    /// Directories archived and signature written
    Saved {
        archive: ArchiveReport,
        fingerprint: Fingerprint,
    },
}

/// Drives one build's restore and save phases
pub struct CacheCoordinator<'a> {
    context: CacheContext,
    fingerprint: Fingerprint,
    metrics: &'a dyn MetricsSink,
    phase: Phase,
    status: Option<CacheStatus>,
}

impl<'a> CacheCoordinator<'a> {
    /// Create a coordinator, computing this build's fingerprint
    pub fn new(
        context: CacheContext,
        identity: &ToolchainIdentity,
        metrics: &'a dyn MetricsSink,
    ) -> Self {
        let fingerprint = compute_fingerprint(identity);
        debug!("Computed fingerprint {:?}", fingerprint.as_str());

        Self {
            context,
            fingerprint,
            metrics,
            phase: Phase::Idle,
            status: None,
        }
    }

    pub fn context(&self) -> &CacheContext {
        &self.context
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resolve the cache status without touching any directories
    pub fn status(&self) -> CacheStatus {
        resolve_for_set(
            &self.context.cache_root,
            &self.fingerprint,
            self.context.enabled,
            &self.context.directories,
        )
    }

    /// Resolve the status, then restore the directory set if it is valid
    pub fn restore(&mut self) -> DepcacheResult<RestoreReport> {
        self.ensure_phase("restore", &[Phase::Idle])?;

        self.enter(Phase::Resolving);
        let status = self.status();
        self.status = Some(status);
        self.metrics.increment(&format!("cache.{}", status));
        info!("Cache status: {}", status);

        if !status.should_restore() {
            self.enter(Phase::SkippingRestore);
            let not_restored = if status == CacheStatus::NewSignature {
                self.context.directories.iter().map(String::from).collect()
            } else {
                Vec::new()
            };
            for dir in &not_restored {
                info!("Not restoring {} ({})", dir, status);
            }

            self.enter(Phase::AwaitingBuild);
            return Ok(RestoreReport {
                status,
                archive: ArchiveReport::default(),
                not_restored,
            });
        }

        self.enter(Phase::Restoring);
        let archive = archive::restore(
            &self.context.cache_root,
            &self.context.working_root,
            &self.context.directories,
        )
        .inspect_err(|_| self.enter(Phase::Failed))?;

        self.enter(Phase::AwaitingBuild);
        Ok(RestoreReport {
            status,
            archive,
            not_restored: Vec::new(),
        })
    }

    /// Report how long the install step took, tagged with the cache status
    pub fn record_install_time(&mut self, elapsed: Duration) {
        let status = match self.status {
            Some(status) => status,
            None => {
                let status = self.status();
                self.status = Some(status);
                status
            }
        };
        self.metrics.timing(INSTALL_TIME_METRIC, elapsed, status);
    }

    /// Clear the cache root, then archive the directory set and write the
    /// new signature. When caching is disabled only the clear happens.
    pub fn save(&mut self) -> DepcacheResult<SaveReport> {
        self.ensure_phase("save", &[Phase::Idle, Phase::AwaitingBuild])?;
        self.enter(Phase::Saving);

        let result = self.save_inner();
        self.enter(if result.is_ok() { Phase::Idle } else { Phase::Failed });
        result
    }

    fn save_inner(&self) -> DepcacheResult<SaveReport> {
        let ctx = &self.context;
        archive::clear(&ctx.cache_root)?;

        if !ctx.enabled {
            info!("Caching disabled, skipping save");
            return Ok(SaveReport::Disabled);
        }

        let archive = archive::save(&ctx.working_root, &ctx.cache_root, &ctx.directories)?;
        write_manifest(&ctx.cache_root, ctx.directories.as_slice())?;
        write_signature(&ctx.cache_root, &self.fingerprint)?;

        info!(
            "Saved {} of {} directories (signature {})",
            archive.count(),
            ctx.directories.len(),
            self.fingerprint.short_id()
        );
        Ok(SaveReport::Saved {
            archive,
            fingerprint: self.fingerprint.clone(),
        })
    }

    fn enter(&mut self, phase: Phase) {
        info!("Cache phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn ensure_phase(&self, action: &'static str, allowed: &[Phase]) -> DepcacheResult<()> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        warn!("Refusing to {} while {}", action, self.phase);
        Err(DepcacheError::InvalidPhase {
            action,
            state: self.phase.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::layout::CacheLayout;
    use crate::cache::signature::read_signature;
    use std::cell::RefCell;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingMetrics {
        counters: RefCell<Vec<String>>,
        timings: RefCell<Vec<(String, CacheStatus)>>,
    }

    impl MetricsSink for RecordingMetrics {
        fn increment(&self, counter: &str) {
            self.counters.borrow_mut().push(counter.to_string());
        }

        fn timing(&self, name: &str, _elapsed: Duration, status: CacheStatus) {
            self.timings.borrow_mut().push((name.to_string(), status));
        }
    }

    struct Build {
        work: TempDir,
        cache: TempDir,
    }

    impl Build {
        fn new() -> Self {
            Self {
                work: TempDir::new().unwrap(),
                cache: TempDir::new().unwrap(),
            }
        }

        fn context(&self, dirs: &[&str], enabled: bool) -> CacheContext {
            CacheContext {
                working_root: self.work.path().to_path_buf(),
                cache_root: self.cache.path().to_path_buf(),
                directories: CacheDirectorySet::custom(dirs.iter().copied()).unwrap(),
                enabled,
            }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.work.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn read(&self, rel: &str) -> Option<String> {
            fs::read_to_string(self.work.path().join(rel)).ok()
        }

        fn wipe_workdir(&self) {
            for entry in fs::read_dir(self.work.path()).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    fs::remove_dir_all(path).unwrap();
                } else {
                    fs::remove_file(path).unwrap();
                }
            }
        }
    }

    fn toolchain(runtime: &str) -> ToolchainIdentity {
        ToolchainIdentity::new("os-X", runtime, "pm", "1.3")
    }

    #[test]
    fn three_build_scenario() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();

        // First build: nothing cached yet
        let mut coord =
            CacheCoordinator::new(build.context(&["vendor/deps"], true), &toolchain("rt-12.0"), &metrics);
        let report = coord.restore().unwrap();
        assert_eq!(report.status, CacheStatus::NoCache);
        assert_eq!(report.archive.count(), 0);
        assert!(report.not_restored.is_empty());

        build.write("vendor/deps/lib.js", "v1 deps");
        let saved = coord.save().unwrap();
        assert!(matches!(saved, SaveReport::Saved { ref archive, .. } if archive.count() == 1));
        assert_eq!(
            read_signature(build.cache.path()).unwrap(),
            compute_fingerprint(&toolchain("rt-12.0"))
        );

        // Second build, same toolchain, fresh checkout
        build.wipe_workdir();
        let mut coord =
            CacheCoordinator::new(build.context(&["vendor/deps"], true), &toolchain("rt-12.0"), &metrics);
        let report = coord.restore().unwrap();
        assert_eq!(report.status, CacheStatus::Valid);
        assert_eq!(report.archive.count(), 1);
        assert_eq!(build.read("vendor/deps/lib.js").as_deref(), Some("v1 deps"));

        // Third build, runtime upgraded
        build.wipe_workdir();
        let mut coord =
            CacheCoordinator::new(build.context(&["vendor/deps"], true), &toolchain("rt-13.0"), &metrics);
        let report = coord.restore().unwrap();
        assert_eq!(report.status, CacheStatus::NewSignature);
        assert_eq!(report.not_restored, vec!["vendor/deps".to_string()]);
        assert_eq!(build.read("vendor/deps/lib.js"), None);

        assert_eq!(
            *metrics.counters.borrow(),
            vec!["cache.no-cache", "cache.valid", "cache.new-signature"]
        );
    }

    #[test]
    fn disabled_clears_and_skips_save() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        build.write("node_modules/a.js", "a");

        let mut coord =
            CacheCoordinator::new(build.context(&["node_modules"], true), &toolchain("rt"), &metrics);
        coord.save().unwrap();
        assert!(read_signature(build.cache.path()).is_some());

        let mut coord =
            CacheCoordinator::new(build.context(&["node_modules"], false), &toolchain("rt"), &metrics);
        let report = coord.restore().unwrap();
        assert_eq!(report.status, CacheStatus::Disabled);
        assert!(matches!(coord.save().unwrap(), SaveReport::Disabled));

        assert!(read_signature(build.cache.path()).is_none());
        assert!(!CacheLayout::new(build.cache.path()).base().exists());
    }

    #[test]
    fn save_leaves_no_orphans_from_previous_set() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        build.write("old/x", "x");
        build.write("new/y", "y");

        let mut coord = CacheCoordinator::new(build.context(&["old"], true), &toolchain("rt"), &metrics);
        coord.save().unwrap();

        let mut coord = CacheCoordinator::new(build.context(&["new"], true), &toolchain("rt"), &metrics);
        coord.save().unwrap();

        let dirs_root = CacheLayout::new(build.cache.path()).dirs_root();
        let mut names: Vec<_> = fs::read_dir(&dirs_root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["new"]);
    }

    #[test]
    fn changed_set_is_not_restored() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        build.write("a/x", "x");

        let mut coord = CacheCoordinator::new(build.context(&["a"], true), &toolchain("rt"), &metrics);
        coord.save().unwrap();

        let coord = CacheCoordinator::new(build.context(&["a", "b"], true), &toolchain("rt"), &metrics);
        assert_eq!(coord.status(), CacheStatus::NewSignature);
    }

    #[test]
    fn restore_failure_is_terminal() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        build.write("deps/x", "x");

        let mut coord = CacheCoordinator::new(build.context(&["deps"], true), &toolchain("rt"), &metrics);
        coord.save().unwrap();

        // Make the destination parent unusable: "deps" will be joined under a file
        let ctx = CacheContext {
            working_root: build.work.path().join("deps/x"),
            ..build.context(&["deps"], true)
        };
        let mut coord = CacheCoordinator::new(ctx, &toolchain("rt"), &metrics);
        let err = coord.restore().unwrap_err();

        assert_eq!(err.directory(), Some("deps"));
        assert_eq!(coord.phase(), Phase::Failed);
        assert!(matches!(
            coord.save().unwrap_err(),
            DepcacheError::InvalidPhase { action: "save", .. }
        ));
    }

    #[test]
    fn restore_runs_once() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        let mut coord = CacheCoordinator::new(build.context(&["deps"], true), &toolchain("rt"), &metrics);

        coord.restore().unwrap();
        assert_eq!(coord.phase(), Phase::AwaitingBuild);
        assert!(coord.restore().is_err());
    }

    #[test]
    fn install_time_tagged_with_status() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        let mut coord = CacheCoordinator::new(build.context(&["deps"], true), &toolchain("rt"), &metrics);

        coord.restore().unwrap();
        coord.record_install_time(Duration::from_secs(3));

        assert_eq!(
            *metrics.timings.borrow(),
            vec![(INSTALL_TIME_METRIC.to_string(), CacheStatus::NoCache)]
        );
    }

    #[test]
    fn save_without_restore_is_allowed() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        build.write("deps/x", "x");

        let mut coord = CacheCoordinator::new(build.context(&["deps"], true), &toolchain("rt"), &metrics);
        coord.save().unwrap();

        assert_eq!(coord.phase(), Phase::Idle);
        assert!(CacheLayout::new(build.cache.path())
            .cached_dir(Path::new("deps/x"))
            .exists());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_phase_transition_is_logged() {
        let build = Build::new();
        let metrics = RecordingMetrics::default();
        build.write("deps/x", "x");

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut coord =
                CacheCoordinator::new(build.context(&["deps"], true), &toolchain("rt"), &metrics);
            coord.restore().unwrap();
            coord.save().unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        for transition in [
            "idle -> resolving",
            "resolving -> skipping restore",
            "skipping restore -> awaiting build",
            "awaiting build -> saving",
            "saving -> idle",
        ] {
            assert!(output.contains(transition), "missing {transition:?} in:\n{output}");
        }
    }
}
