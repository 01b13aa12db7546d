//! Shared runner for one-shot ffmpeg commands.

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::process::ExitStatus;

/// Spawns `cmd`, drains its events and waits for it.
///
/// Error and fatal log lines are kept; a non-zero exit becomes a
/// `CommandFailed` error whose stderr is those lines. `label` names the
/// command in logs and errors.
pub fn run_ffmpeg(mut cmd: FfmpegCommand, label: &str) -> CoreResult<()> {
    log::debug!("Running {}: {:?}", label, cmd);

    let mut child = cmd.spawn().map_err(|e| command_start_error(label, e))?;

    let mut error_lines = Vec::new();
    let events = child.iter().map_err(|e| {
        log::error!("Failed to get ffmpeg event iterator for {}: {}", label, e);
        command_failed_error(label, ExitStatus::default(), e.to_string())
    })?;
    for event in events {
        match event {
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                log::debug!("{}: {}", label, line);
                error_lines.push(line);
            }
            FfmpegEvent::Error(line) => error_lines.push(line),
            _ => {}
        }
    }

    let status = child.wait().map_err(|e| command_wait_error(label, e))?;
    if !status.success() {
        log::error!("{} failed: {}", label, status);
        return Err(command_failed_error(label, status, error_lines.join("\n")));
    }
    Ok(())
}
