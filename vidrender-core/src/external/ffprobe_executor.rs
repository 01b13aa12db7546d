//! FFprobe integration for reading source properties.
//!
//! The pipeline needs a handful of facts about a media file: duration,
//! dimensions, frame rate, frame count, codec and whether an audio stream is
//! present. [`FfprobeExecutor`] is the seam; [`CrateFfprobeExecutor`] reads
//! them with the `ffprobe` crate.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::utils::parse_frame_rate;
use ffprobe::{FfProbeError, ffprobe};
use std::path::Path;

/// Facts about a media file needed by the segmenter, filter engine, merger
/// and analytics probe.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProperties {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    /// Frames per second; average rate when known, else the stream's base rate.
    pub frame_rate: f64,
    /// `nb_frames` when the container reports it.
    pub total_frames: Option<u64>,
    pub has_audio: bool,
    pub video_codec: Option<String>,
}

/// Trait for reading [`SourceProperties`] from a file.
pub trait FfprobeExecutor: Send + Sync {
    fn probe(&self, input_path: &Path) -> CoreResult<SourceProperties>;
}

/// Concrete implementation of `FfprobeExecutor` using the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn probe(&self, input_path: &Path) -> CoreResult<SourceProperties> {
        log::debug!("Running ffprobe (via crate) on: {}", input_path.display());

        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!("ffprobe failed on {}: {:?}", input_path.display(), err);
            map_ffprobe_error(err, input_path)
        })?;

        let probe_error = |message: &str| CoreError::Probe {
            path: input_path.display().to_string(),
            message: message.to_string(),
        };

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| probe_error("no video stream"))?;

        let width = video_stream
            .width
            .and_then(|w| u32::try_from(w).ok())
            .ok_or_else(|| probe_error("video stream missing width"))?;
        let height = video_stream
            .height
            .and_then(|h| u32::try_from(h).ok())
            .ok_or_else(|| probe_error("video stream missing height"))?;

        let frame_rate = parse_frame_rate(&video_stream.avg_frame_rate)
            .or_else(|| parse_frame_rate(&video_stream.r_frame_rate))
            .ok_or_else(|| probe_error("video stream has no usable frame rate"))?;

        // Stream duration first, container duration as fallback.
        let duration_secs = video_stream
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| *d > 0.0)
            .or_else(|| {
                metadata
                    .format
                    .duration
                    .as_deref()
                    .and_then(|d| d.parse::<f64>().ok())
            })
            .ok_or_else(|| probe_error("duration unavailable"))?;

        let total_frames = video_stream
            .nb_frames
            .as_deref()
            .and_then(|f| f.parse::<u64>().ok());

        let has_audio = metadata
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        Ok(SourceProperties {
            duration_secs,
            width,
            height,
            frame_rate,
            total_frames,
            has_audio,
            video_codec: video_stream.codec_name.clone(),
        })
    }
}

fn map_ffprobe_error(err: FfProbeError, input_path: &Path) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error("ffprobe", io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error("ffprobe", output.status, stderr)
        }
        other => CoreError::Probe {
            path: input_path.display().to_string(),
            message: format!("{other:?}"),
        },
    }
}
