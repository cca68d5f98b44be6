//! Save command - archive dependency directories after a successful build

use crate::cache::{ArchiveOutcome, CacheCoordinator, SaveReport};
use crate::cli::args::ToolchainArgs;
use crate::config::Config;
use crate::error::DepcacheResult;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the save command
pub async fn execute(args: ToolchainArgs, config: &Config, workdir: &Path) -> DepcacheResult<()> {
    let ctx = UiContext::detect();
    let identity = super::identity(config, &args).await;
    let metrics = super::metrics_sink(config);
    let mut coordinator = super::coordinator(config, workdir, &identity, metrics.as_ref())?;

    save_with_notices(&ctx, &mut coordinator)?;
    Ok(())
}

/// Run the save phase, printing one line per directory
pub(crate) fn save_with_notices(
    ctx: &UiContext,
    coordinator: &mut CacheCoordinator<'_>,
) -> DepcacheResult<SaveReport> {
    ui::section(ctx, "Caching build");

    let directories = &coordinator.context().directories;
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!(
        "Saving {} directories ({})...",
        directories.len(),
        directories.source()
    ));

    let report = match coordinator.save() {
        Ok(report) => {
            spinner.clear();
            report
        }
        Err(e) => {
            spinner.stop_error("Cache save failed");
            return Err(e);
        }
    };

    match &report {
        SaveReport::Disabled => {
            ui::step_info(ctx, "Skipping cache save (disabled by config)");
        }
        SaveReport::Saved { archive, .. } => {
            for entry in &archive.entries {
                match entry.outcome {
                    ArchiveOutcome::Copied { bytes, .. } => {
                        ui::step_ok_detail(ctx, &entry.directory, &ui::format_bytes(bytes));
                    }
                    ArchiveOutcome::Skipped => {
                        ui::remark(ctx, &format!("- {} (nothing to cache)", entry.directory));
                    }
                }
            }
        }
    }

    Ok(report)
}
