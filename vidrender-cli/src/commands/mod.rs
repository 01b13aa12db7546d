//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific subcommand.

/// `filters`: lists the available filters.
pub mod filters;

/// `probe`: prints source analytics.
pub mod probe;

/// `process`: runs a job end to end and reports the benchmark.
pub mod process;

use crate::error::CliResult;
use vidrender_core::CoreError;

use std::fs;
use std::path::{Path, PathBuf};

/// Canonical path of an existing regular file.
pub fn resolve_input_file(input: &Path) -> CliResult<PathBuf> {
    let path = input.canonicalize().map_err(|e| {
        CoreError::OperationFailed(format!("Invalid input path '{}': {}", input.display(), e))
    })?;
    let metadata = fs::metadata(&path).map_err(|e| {
        CoreError::OperationFailed(format!("Failed to access input path '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(CoreError::OperationFailed(format!(
            "Invalid input path '{}': not a file",
            input.display()
        )));
    }
    Ok(path)
}
