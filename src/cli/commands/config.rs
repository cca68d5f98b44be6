//! Config command - show effective configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::DepcacheResult;
use std::path::Path;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, config_path: &Path) -> DepcacheResult<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}
