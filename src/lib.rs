//! depcache - persistent dependency cache for build pipelines
//!
//! Decides on every build whether previously saved dependency directories
//! are still valid for the active toolchain, restores them when they are,
//! and saves them again once the build succeeds.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod toolchain;
pub mod ui;

pub use error::{DepcacheError, DepcacheResult};
