//! CLI command implementations

pub mod clear;
pub mod config;
pub mod restore;
pub mod run;
pub mod save;
pub mod status;

pub use clear::execute as clear;
pub use config::execute as config;
pub use restore::execute as restore;
pub use run::execute as run;
pub use save::execute as save;
pub use status::execute as status;

use crate::cache::{CacheCoordinator, ToolchainIdentity};
use crate::cli::args::ToolchainArgs;
use crate::config::Config;
use crate::telemetry::{JsonLinesMetrics, MetricsSink, NoopMetrics};
use crate::toolchain::{detect_identity, ToolchainOverrides};
use crate::error::DepcacheResult;
use std::path::Path;

/// Metrics sink selected by config
pub(crate) fn metrics_sink(config: &Config) -> Box<dyn MetricsSink> {
    if config.metrics.enabled {
        Box::new(JsonLinesMetrics::new(config.metrics_path(), true))
    } else {
        Box::new(NoopMetrics)
    }
}

/// Probe the toolchain, honoring any overrides from the command line
pub(crate) async fn identity(config: &Config, args: &ToolchainArgs) -> ToolchainIdentity {
    detect_identity(&config.toolchain, &ToolchainOverrides::from(args)).await
}

/// Build a coordinator for this invocation
pub(crate) fn coordinator<'a>(
    config: &Config,
    workdir: &Path,
    identity: &ToolchainIdentity,
    metrics: &'a dyn MetricsSink,
) -> DepcacheResult<CacheCoordinator<'a>> {
    Ok(CacheCoordinator::new(
        config.cache_context(workdir)?,
        identity,
        metrics,
    ))
}
