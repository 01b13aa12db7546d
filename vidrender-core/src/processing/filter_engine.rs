// ============================================================================
// vidrender-core/src/processing/filter_engine.rs
// ============================================================================
//
// FILTER ENGINE: Apply a Frame Filter to a Whole Segment
//
// A raw segment is decoded to rgb24 frames, each frame is passed through the
// FrameFilter for the job's FilterKind, and the frames are piped into an
// encoder that writes the processed segment. Encoder flags are fixed and
// bit-exact so that the same segment and filter give byte-identical files no
// matter which thread or pass produced them.
//
// Any failure is reported as a FilterError carrying the segment index.

// ---- External crate imports ----
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use image::RgbImage;

// ---- Internal crate imports ----
use crate::config::EncoderSettings;
use crate::error::{
    CoreError, CoreResult, FilterError, command_failed_error, command_start_error,
    command_wait_error,
};
use crate::external::FfprobeExecutor;
use crate::filters::FilterKind;
use crate::job::Segment;

// ---- Standard library imports ----
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, ExitStatus};
use std::sync::Arc;

/// Applies one filter kind to one segment, writing `output`.
pub trait SegmentFilter: Send + Sync {
    fn apply(
        &self,
        segment: &Segment,
        kind: FilterKind,
        output: &Path,
    ) -> Result<PathBuf, FilterError>;
}

/// Arguments for the encoder that reads filtered rgb24 frames on stdin.
pub fn build_encoder_args(
    width: u32,
    height: u32,
    frame_rate: f64,
    encoder: &EncoderSettings,
    output: &Path,
) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-nostats".into(),
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{width}x{height}"),
        "-r".into(),
        format!("{frame_rate}"),
        "-i".into(),
        "-".into(),
        "-an".into(),
        "-c:v".into(),
        encoder.video_codec.clone(),
        "-preset".into(),
        encoder.preset.clone(),
        "-crf".into(),
        encoder.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-threads".into(),
        encoder.threads.to_string(),
        "-map_metadata".into(),
        "-1".into(),
        "-fflags".into(),
        "+bitexact".into(),
        "-flags:v".into(),
        "+bitexact".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Input half of the decoder command: first video stream of `raw` only.
/// `rawvideo()` appends the rgb24 pipe output.
pub fn build_decode_args(raw: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        raw.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
    ]
}

struct FrameEncoder {
    child: FfmpegChild,
    stdin: BufWriter<ChildStdin>,
}

/// Decode, filter and re-encode through two ffmpeg processes.
pub struct FfmpegSegmentFilter {
    prober: Arc<dyn FfprobeExecutor>,
    encoder: EncoderSettings,
}

impl FfmpegSegmentFilter {
    pub fn new(prober: Arc<dyn FfprobeExecutor>, encoder: EncoderSettings) -> Self {
        Self { prober, encoder }
    }

    fn spawn_encoder(
        &self,
        width: u32,
        height: u32,
        frame_rate: f64,
        output: &Path,
    ) -> CoreResult<FrameEncoder> {
        let mut cmd = FfmpegCommand::new();
        cmd.args(build_encoder_args(width, height, frame_rate, &self.encoder, output));
        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (encode)", e))?;
        let stdin = child.take_stdin().ok_or_else(|| {
            CoreError::OperationFailed("ffmpeg encoder has no stdin".to_string())
        })?;
        Ok(FrameEncoder {
            child,
            stdin: BufWriter::new(stdin),
        })
    }

    fn render(&self, segment: &Segment, kind: FilterKind, output: &Path) -> CoreResult<u64> {
        let props = self.prober.probe(&segment.raw_path)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut decode = FfmpegCommand::new();
        decode
            .hide_banner()
            .args(build_decode_args(&segment.raw_path))
            .rawvideo();
        let mut decoder = decode
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (decode)", e))?;

        let mut encoder: Option<FrameEncoder> = None;
        let result = self.pump_frames(&mut decoder, &mut encoder, kind, props.frame_rate, output);

        let (frames, mut encoder) = match (result, encoder) {
            (Ok(frames), Some(encoder)) => (frames, encoder),
            (Ok(_), None) => {
                return Err(CoreError::OperationFailed(format!(
                    "no frames decoded from {}",
                    segment.raw_path.display()
                )));
            }
            (Err(e), encoder) => {
                let _ = decoder.kill();
                let _ = decoder.wait();
                if let Some(mut encoder) = encoder {
                    let _ = encoder.child.kill();
                    let _ = encoder.child.wait();
                }
                return Err(e);
            }
        };

        // Closing stdin lets the encoder flush and exit.
        encoder.stdin.flush()?;
        drop(encoder.stdin);
        let errors = drain_errors(&mut encoder.child, "ffmpeg (encode)")?;
        let status = encoder
            .child
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (encode)", e))?;
        if !status.success() {
            return Err(command_failed_error("ffmpeg (encode)", status, errors.join("\n")));
        }

        Ok(frames)
    }

    fn pump_frames(
        &self,
        decoder: &mut FfmpegChild,
        encoder: &mut Option<FrameEncoder>,
        kind: FilterKind,
        frame_rate: f64,
        output: &Path,
    ) -> CoreResult<u64> {
        let filter = kind.frame_filter();
        let mut frames = 0u64;
        let mut errors = Vec::new();

        let events = decoder.iter().map_err(|e| {
            command_failed_error("ffmpeg (decode)", ExitStatus::default(), e.to_string())
        })?;
        for event in events {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let (width, height) = (frame.width, frame.height);
                    let mut image = RgbImage::from_raw(width, height, frame.data).ok_or_else(|| {
                        CoreError::OperationFailed(format!(
                            "frame {} has the wrong size for {}x{}",
                            frame.frame_num, width, height
                        ))
                    })?;
                    filter.apply(&mut image);

                    if encoder.is_none() {
                        *encoder = Some(self.spawn_encoder(width, height, frame_rate, output)?);
                    }
                    if let Some(encoder) = encoder.as_mut() {
                        encoder.stdin.write_all(image.as_raw())?;
                    }
                    frames += 1;
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) | FfmpegEvent::Error(line) => {
                    errors.push(line);
                }
                _ => {}
            }
        }

        let status = decoder
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (decode)", e))?;
        if !status.success() {
            return Err(command_failed_error("ffmpeg (decode)", status, errors.join("\n")));
        }
        Ok(frames)
    }
}

impl SegmentFilter for FfmpegSegmentFilter {
    fn apply(
        &self,
        segment: &Segment,
        kind: FilterKind,
        output: &Path,
    ) -> Result<PathBuf, FilterError> {
        log::debug!(
            "Applying {} to segment {} ({:.2}s) -> {}",
            kind,
            segment.index,
            segment.duration(),
            output.display()
        );
        match self.render(segment, kind, output) {
            Ok(frames) => {
                log::debug!("Segment {}: {} frame(s) filtered", segment.index, frames);
                Ok(output.to_path_buf())
            }
            Err(e) => {
                log::error!("Filter {} failed on segment {}: {}", kind, segment.index, e);
                Err(FilterError::new(segment.index, e.to_string()))
            }
        }
    }
}

fn drain_errors(child: &mut FfmpegChild, label: &str) -> CoreResult<Vec<String>> {
    let events = child
        .iter()
        .map_err(|e| command_failed_error(label, ExitStatus::default(), e.to_string()))?;
    Ok(events
        .filter_map(|event| match event {
            FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) | FfmpegEvent::Error(line) => {
                Some(line)
            }
            _ => None,
        })
        .collect())
}
