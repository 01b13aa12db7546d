// ============================================================================
// vidrender-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates the external command-line tools the pipeline
// depends on. Probing sits behind a trait so the pipeline can be driven with
// fakes in tests; ffmpeg invocations share one runner that drains events and
// turns a non-zero exit into a CoreError carrying the tool's error output.
//
// KEY COMPONENTS:
// - FfprobeExecutor: Trait for reading source properties
// - CrateFfprobeExecutor: Implementation using the ffprobe crate
// - run_ffmpeg: Spawn, drain and wait for one ffmpeg command
// - check_dependency: Verify a tool is installed

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, command_start_error};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Shared ffmpeg runner
pub mod ffmpeg;

/// Traits and implementations for executing ffprobe
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg::run_ffmpeg;
pub use ffprobe_executor::{CrateFfprobeExecutor, FfprobeExecutor, SourceProperties};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that an external command is installed by running it with
/// `-version`.
///
/// # Returns
///
/// * `Ok(())` - The command started
/// * `Err(CoreError::DependencyNotFound)` - The command is not on PATH
/// * `Err(CoreError::CommandStart)` - The command exists but failed to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(command_start_error(cmd_name, e))
        }
    }
}
