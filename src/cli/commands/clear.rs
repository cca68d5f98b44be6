//! Clear command - wipe the cache root

use crate::cache::{archive, CacheLayout};
use crate::cli::args::ClearArgs;
use crate::config::Config;
use crate::error::DepcacheResult;
use crate::ui::{self, UiContext};

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> DepcacheResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let cache_root = config.cache_root();
    let layout = CacheLayout::new(&cache_root);

    if !layout.base().exists() {
        println!("Cache at {} is already empty.", cache_root.display());
        return Ok(());
    }

    let prompt = format!("Remove all cached directories in {}?", cache_root.display());
    if !ui::confirm(&ctx, &prompt, false).await? {
        println!("Aborted.");
        return Ok(());
    }

    archive::clear(&cache_root)?;
    ui::step_ok(&ctx, &format!("Cleared {}", cache_root.display()));
    Ok(())
}
