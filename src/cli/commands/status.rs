//! Status command - show what the next restore would do

use crate::cache::{read_signature, CacheStatus};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::DepcacheResult;
use crate::telemetry::NoopMetrics;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct StatusJson {
    status: CacheStatus,
    enabled: bool,
    working_root: PathBuf,
    cache_root: PathBuf,
    directories: Vec<String>,
    directory_source: String,
    fingerprint: String,
    stored_signature: Option<String>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config, workdir: &Path) -> DepcacheResult<()> {
    let identity = super::identity(config, &args.toolchain).await;
    // Status is read-only; it must not count as a build
    let metrics = NoopMetrics;
    let coordinator = super::coordinator(config, workdir, &identity, &metrics)?;

    let ctx = coordinator.context();
    let status = coordinator.status();
    let stored = read_signature(&ctx.cache_root);

    let summary = StatusJson {
        status,
        enabled: ctx.enabled,
        working_root: ctx.working_root.clone(),
        cache_root: ctx.cache_root.clone(),
        directories: ctx.directories.as_slice().to_vec(),
        directory_source: ctx.directories.source().to_string(),
        fingerprint: coordinator.fingerprint().to_string(),
        stored_signature: stored.map(|s| s.to_string()),
    };

    match args.format {
        OutputFormat::Table => print_table(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => println!("{}", summary.status),
    }

    Ok(())
}

fn print_table(summary: &StatusJson) {
    let ctx = UiContext::detect();
    println!("{}", style("Cache Status").bold().cyan());
    println!();

    ui::key_value_status(
        &ctx,
        "Status",
        summary.status.as_str(),
        summary.status == CacheStatus::Valid,
    );
    ui::key_value(&ctx, "Enabled", if summary.enabled { "yes" } else { "no" });
    ui::key_value(&ctx, "Working dir", &summary.working_root.display().to_string());
    ui::key_value(&ctx, "Cache root", &summary.cache_root.display().to_string());
    ui::key_value(
        &ctx,
        "Directories",
        &format!("{} ({})", summary.directories.join(", "), summary.directory_source),
    );
    ui::key_value(&ctx, "Fingerprint", &summary.fingerprint);
    ui::key_value(
        &ctx,
        "Stored",
        summary.stored_signature.as_deref().unwrap_or("(none)"),
    );
}
