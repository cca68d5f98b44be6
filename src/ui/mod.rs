//! Human-readable notices for build logs
//!
//! Uses `cliclack` in an interactive terminal and plain `[OK]`/`[WARN]`
//! prefixed lines everywhere else, which in practice means build logs.

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    format_bytes, key_value, key_value_status, remark, section, step_info, step_ok,
    step_ok_detail, step_warn,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
pub use theme::{init_theme, DepcacheTheme};
