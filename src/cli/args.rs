//! CLI argument definitions using clap derive

use crate::toolchain::ToolchainOverrides;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// depcache - dependency cache for build pipelines
///
/// Restores dependency directories saved by a previous build when the
/// toolchain is unchanged, and saves them again after a successful install.
#[derive(Parser, Debug)]
#[command(name = "depcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DEPCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .depcache.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Build working directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub workdir: Option<PathBuf>,

    /// Cache root directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore cached directories if the toolchain is unchanged
    Restore(ToolchainArgs),

    /// Save directories to the cache after a successful build
    Save(ToolchainArgs),

    /// Restore, run an install command, then save on success
    Run(RunArgs),

    /// Show the cache status for this build
    Status(StatusArgs),

    /// Remove everything stored in the cache root
    Clear(ClearArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Toolchain identity overrides; anything unset is probed
#[derive(Args, Debug, Clone, Default)]
pub struct ToolchainArgs {
    /// Platform image identifier (e.g. heroku-22)
    #[arg(long, env = "DEPCACHE_PLATFORM")]
    pub platform: Option<String>,

    /// Runtime version
    #[arg(long, env = "DEPCACHE_RUNTIME_VERSION")]
    pub runtime_version: Option<String>,

    /// Package manager name
    #[arg(long, env = "DEPCACHE_PM_NAME")]
    pub pm_name: Option<String>,

    /// Package manager version
    #[arg(long, env = "DEPCACHE_PM_VERSION")]
    pub pm_version: Option<String>,
}

impl From<&ToolchainArgs> for ToolchainOverrides {
    fn from(args: &ToolchainArgs) -> Self {
        Self {
            platform: args.platform.clone(),
            runtime_version: args.runtime_version.clone(),
            package_manager_name: args.pm_name.clone(),
            package_manager_version: args.pm_version.clone(),
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub toolchain: ToolchainArgs,

    /// Install command to run between restore and save
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub toolchain: ToolchainArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Status label only
    Plain,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,
}
