//! Run command - restore, run the install command, save on success

use super::restore::restore_with_notices;
use super::save::save_with_notices;
use crate::cli::args::RunArgs;
use crate::config::Config;
use crate::error::{DepcacheError, DepcacheResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config, workdir: &Path) -> DepcacheResult<()> {
    let ctx = UiContext::detect();
    let identity = super::identity(config, &args.toolchain).await;
    let metrics = super::metrics_sink(config);
    let mut coordinator = super::coordinator(config, workdir, &identity, metrics.as_ref())?;

    restore_with_notices(&ctx, &mut coordinator)?;

    let command_line = args.command.join(" ");
    ui::section(&ctx, &format!("Running {}", command_line));

    let started = Instant::now();
    let code = run_install(&args.command, workdir).await?;
    let elapsed = started.elapsed();
    coordinator.record_install_time(elapsed);
    info!("Install finished in {:.1}s with code {}", elapsed.as_secs_f64(), code);

    if code != 0 {
        return Err(DepcacheError::InstallFailed {
            command: command_line,
            code,
        });
    }

    save_with_notices(&ctx, &mut coordinator)?;
    Ok(())
}

/// Run the install command with inherited stdio, returning its exit code
async fn run_install(command: &[String], workdir: &Path) -> DepcacheResult<i32> {
    let Some((program, rest)) = command.split_first() else {
        return Err(DepcacheError::User("No install command given".to_string()));
    };

    debug!("Executing: {} {:?} in {}", program, rest, workdir.display());
    let status = Command::new(program)
        .args(rest)
        .current_dir(workdir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| DepcacheError::command_failed(command.join(" "), e))?;

    Ok(status.code().unwrap_or(-1))
}
