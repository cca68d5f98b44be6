//! Restore command - bring cached directories back before the install

use crate::cache::{ArchiveOutcome, CacheCoordinator, CacheStatus, RestoreReport};
use crate::cli::args::ToolchainArgs;
use crate::config::Config;
use crate::error::DepcacheResult;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the restore command
pub async fn execute(args: ToolchainArgs, config: &Config, workdir: &Path) -> DepcacheResult<()> {
    let ctx = UiContext::detect();
    let identity = super::identity(config, &args).await;
    let metrics = super::metrics_sink(config);
    let mut coordinator = super::coordinator(config, workdir, &identity, metrics.as_ref())?;

    restore_with_notices(&ctx, &mut coordinator)?;
    Ok(())
}

/// Run the restore phase, printing one line per decision and directory
pub(crate) fn restore_with_notices(
    ctx: &UiContext,
    coordinator: &mut CacheCoordinator<'_>,
) -> DepcacheResult<RestoreReport> {
    ui::section(ctx, "Restoring cache");

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Checking cache signature...");
    let report = match coordinator.restore() {
        Ok(report) => {
            spinner.clear();
            report
        }
        Err(e) => {
            spinner.stop_error("Cache restore failed");
            return Err(e);
        }
    };

    print_restore(ctx, &report);
    Ok(report)
}

fn print_restore(ctx: &UiContext, report: &RestoreReport) {
    match report.status {
        CacheStatus::Disabled => {
            ui::step_info(ctx, "Skipping cache restore (disabled by config)");
        }
        CacheStatus::NoCache => {
            ui::step_info(ctx, "Skipping cache restore (no cached directories yet)");
        }
        CacheStatus::NewSignature => {
            ui::step_warn(ctx, "Skipping cache restore (new-signature)");
            for dir in &report.not_restored {
                ui::remark(ctx, &format!("- {} (not restored)", dir));
            }
            ui::remark(
                ctx,
                "Cached directories were not restored because the toolchain or the \
                 cached directory list changed. Installation may take longer for this build.",
            );
        }
        CacheStatus::Valid => {
            for entry in &report.archive.entries {
                match entry.outcome {
                    ArchiveOutcome::Copied { bytes, .. } => {
                        ui::step_ok_detail(ctx, &entry.directory, &ui::format_bytes(bytes));
                    }
                    ArchiveOutcome::Skipped => {
                        ui::remark(ctx, &format!("- {} (not cached - skipping)", entry.directory));
                    }
                }
            }
        }
    }
}
