// ============================================================================
// vidrender-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Helper Functions for Logging
//
// The logger itself is configured by vidrender-core's log4rs setup, called
// from main.rs. This module holds the CLI-side helpers around it.

use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// ```
/// let name = format!("vidrender_{}.log", vidrender::logging::get_timestamp());
/// assert!(name.starts_with("vidrender_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Log file for one invocation inside `log_dir`.
pub fn log_file_path(log_dir: &Path, command: &str) -> PathBuf {
    log_dir.join(format!("vidrender_{}_{}.log", command, get_timestamp()))
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}
