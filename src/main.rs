//! depcache - dependency cache for build pipelines
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use depcache::cli::{Cli, Commands};
use depcache::config::{self, Config, ConfigManager};
use depcache::error::{DepcacheError, DepcacheResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DepcacheResult<()> {
    let cli = Cli::parse();

    let workdir = match cli.workdir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| DepcacheError::io("getting current directory", e))?,
    };

    let config_manager = match cli.config.clone() {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    let config = load_config(&cli, &config_manager, &workdir).await?;
    init_logging(cli.verbose, &config);
    depcache::ui::init_theme();

    debug!("Working directory: {}", workdir.display());
    debug!("Cache root: {}", config.cache_root().display());

    match cli.command {
        Commands::Restore(args) => depcache::cli::commands::restore(args, &config, &workdir).await,
        Commands::Save(args) => depcache::cli::commands::save(args, &config, &workdir).await,
        Commands::Run(args) => depcache::cli::commands::run(args, &config, &workdir).await,
        Commands::Status(args) => depcache::cli::commands::status(args, &config, &workdir).await,
        Commands::Clear(args) => depcache::cli::commands::clear(args, &config).await,
        Commands::Config(args) => {
            depcache::cli::commands::config(args, &config, config_manager.path()).await
        }
    }
}

/// Global file, then local file, then environment, then flags
async fn load_config(
    cli: &Cli,
    manager: &ConfigManager,
    workdir: &Path,
) -> DepcacheResult<Config> {
    let local_config_path: Option<PathBuf> = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(workdir)
    };

    let mut config = manager.load_merged(local_config_path.as_deref()).await?;
    config::apply_process_env(&mut config);

    if let Some(ref dir) = cli.cache_dir {
        config.cache.root = Some(dir.clone());
    }

    Ok(config)
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => 1,
        v => v,
    };
    let filter = match level {
        0 => EnvFilter::new("depcache=warn"),
        1 => EnvFilter::new("depcache=info"),
        _ => EnvFilter::new("depcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
