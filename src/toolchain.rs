//! Toolchain version detection
//!
//! Runs the configured version commands and builds the identity the cache
//! fingerprint is derived from. A command that is missing, fails, or prints
//! nothing yields [`UNKNOWN`], which forces a cache miss.

use crate::cache::{ToolchainIdentity, UNKNOWN};
use crate::config::schema::ToolchainConfig;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Explicit values that bypass probing
#[derive(Debug, Clone, Default)]
pub struct ToolchainOverrides {
    pub platform: Option<String>,
    pub runtime_version: Option<String>,
    pub package_manager_name: Option<String>,
    pub package_manager_version: Option<String>,
}

/// Run a version command and return its first non-empty output line
pub async fn probe_version(command: &[String]) -> String {
    let Some((program, args)) = command.split_first() else {
        return UNKNOWN.to_string();
    };

    debug!("Probing version: {} {:?}", program, args);
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            warn!("{} exited with {}, version unknown", program, output.status);
            return UNKNOWN.to_string();
        }
        Err(e) => {
            warn!("Could not run {}: {}, version unknown", program, e);
            return UNKNOWN.to_string();
        }
    };

    first_line(&String::from_utf8_lossy(&output.stdout))
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Resolve the toolchain identity, preferring overrides over probes
pub async fn detect_identity(
    config: &ToolchainConfig,
    overrides: &ToolchainOverrides,
) -> ToolchainIdentity {
    let runtime_version = match &overrides.runtime_version {
        Some(v) => v.clone(),
        None => probe_version(&config.runtime_version_command).await,
    };

    let package_manager_version = match &overrides.package_manager_version {
        Some(v) => v.clone(),
        None => probe_version(&config.package_manager_version_command).await,
    };

    let platform = overrides
        .platform
        .clone()
        .or_else(|| config.platform.clone())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let package_manager_name = overrides
        .package_manager_name
        .clone()
        .unwrap_or_else(|| config.package_manager.clone());

    ToolchainIdentity::new(
        platform,
        runtime_version,
        package_manager_name,
        package_manager_version,
    )
}
