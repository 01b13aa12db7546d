// ============================================================================
// vidrender-core/src/processing/segmenter.rs
// ============================================================================
//
// SEGMENTER: Split a Source into Fixed-Length Segments
//
// The source is cut at every multiple of the segment length L, giving
// ceil(D / L) contiguous segments that partition [0, D). The final segment
// carries the remainder. Each segment is written as an independently
// playable file; audio is dropped here and restored by the merger.
//
// KEY COMPONENTS:
// - plan_segments: Pure boundary computation
// - reconcile_spans: Matches the plan against the files ffmpeg produced
// - Segmenter: Trait seam used by the orchestrator
// - FfmpegSegmenter: One ffmpeg pass using the segment muxer

// ---- External crate imports ----
use ffmpeg_sidecar::command::FfmpegCommand;
use log::{debug, info, warn};

// ---- Internal crate imports ----
use crate::config::EncoderSettings;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfprobeExecutor, run_ffmpeg};
use crate::job::{JobLayout, Segment};

// ---- Standard library imports ----
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Boundaries of one planned segment, `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpan {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

/// Splits `[0, duration)` into `ceil(duration / segment_len)` spans cut at
/// multiples of `segment_len`.
pub fn plan_segments(duration: f64, segment_len: f64) -> CoreResult<Vec<SegmentSpan>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CoreError::Segmentation(format!(
            "source duration must be positive, got {duration}"
        )));
    }
    if !segment_len.is_finite() || segment_len <= 0.0 {
        return Err(CoreError::Segmentation(format!(
            "segment length must be positive, got {segment_len}"
        )));
    }

    let count = (duration / segment_len).ceil() as usize;
    Ok((0..count)
        .map(|index| {
            let start = index as f64 * segment_len;
            let end = if index + 1 == count {
                duration
            } else {
                (index + 1) as f64 * segment_len
            };
            SegmentSpan { index, start, end }
        })
        .collect())
}

/// Matches the planned spans to the number of files actually produced.
///
/// The only tolerated mismatch is a final span shorter than one frame, which
/// the muxer cannot emit as a file: it is folded into the previous span so the
/// spans still cover `[0, duration)`.
pub fn reconcile_spans(
    mut spans: Vec<SegmentSpan>,
    produced: usize,
    frame_duration: f64,
) -> CoreResult<Vec<SegmentSpan>> {
    if produced == spans.len() {
        return Ok(spans);
    }

    if produced + 1 == spans.len() && spans.len() >= 2 {
        if let Some(tail) = spans.last().copied() {
            if tail.end - tail.start < frame_duration {
                spans.pop();
                if let Some(last) = spans.last_mut() {
                    last.end = tail.end;
                }
                debug!(
                    "Folded {:.3}s tail into segment {}",
                    tail.end - tail.start,
                    tail.index - 1
                );
                return Ok(spans);
            }
        }
    }

    Err(CoreError::Segmentation(format!(
        "expected {} segment files, found {}",
        spans.len(),
        produced
    )))
}

/// Boundaries passed to `-segment_times` and `-force_key_frames`.
fn cut_points(spans: &[SegmentSpan]) -> String {
    spans
        .iter()
        .skip(1)
        .map(|span| format!("{:.6}", span.start))
        .collect::<Vec<_>>()
        .join(",")
}

/// Arguments for the single segmenting pass.
pub fn build_segment_args(
    source: &Path,
    spans: &[SegmentSpan],
    encoder: &EncoderSettings,
    output_pattern: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-y".into(),
        "-i".into(),
        source.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
        "-an".into(),
        "-sn".into(),
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
    ];

    let cuts = cut_points(spans);
    if !cuts.is_empty() {
        // Keyframes exactly on the cuts make every segment start cleanly.
        args.extend(["-force_key_frames".into(), cuts.clone()]);
        args.extend(["-segment_times".into(), cuts]);
    }

    args.extend([
        "-f".into(),
        "segment".into(),
        "-reset_timestamps".into(),
        "1".into(),
        "-segment_start_number".into(),
        "0".into(),
        "-segment_format".into(),
        "mp4".into(),
        output_pattern.to_string_lossy().into_owned(),
    ]);
    args
}

/// Produces the ordered segment list for a source.
pub trait Segmenter: Send + Sync {
    fn segment(&self, source: &Path, layout: &JobLayout) -> CoreResult<Vec<Segment>>;
}

/// Segmenter backed by ffmpeg's segment muxer.
pub struct FfmpegSegmenter {
    prober: Arc<dyn FfprobeExecutor>,
    segment_len: f64,
    encoder: EncoderSettings,
}

impl FfmpegSegmenter {
    pub fn new(prober: Arc<dyn FfprobeExecutor>, segment_len: f64, encoder: EncoderSettings) -> Self {
        Self {
            prober,
            segment_len,
            encoder,
        }
    }
}

impl Segmenter for FfmpegSegmenter {
    fn segment(&self, source: &Path, layout: &JobLayout) -> CoreResult<Vec<Segment>> {
        let props = self.prober.probe(source).map_err(|e| {
            CoreError::Segmentation(format!("cannot read source {}: {}", source.display(), e))
        })?;

        let spans = plan_segments(props.duration_secs, self.segment_len)?;
        info!(
            "Segmenting {} ({:.2}s) into {} segment(s) of {}s",
            source.display(),
            props.duration_secs,
            spans.len(),
            self.segment_len
        );

        let raw_dir = layout.raw_dir();
        fs::create_dir_all(&raw_dir)?;

        let pattern = raw_dir.join("segment_%03d.mp4");
        let args = build_segment_args(source, &spans, &self.encoder, &pattern);
        let mut cmd = FfmpegCommand::new();
        cmd.args(&args);
        run_ffmpeg(cmd, "ffmpeg (segment)")
            .map_err(|e| CoreError::Segmentation(e.to_string()))?;

        let produced = (0..)
            .take_while(|&i| {
                fs::metadata(layout.raw_segment(i))
                    .map(|m| m.len() > 0)
                    .unwrap_or(false)
            })
            .count();
        if produced != spans.len() {
            warn!(
                "Planned {} segments for {}, ffmpeg wrote {}",
                spans.len(),
                source.display(),
                produced
            );
        }

        let spans = reconcile_spans(spans, produced, 1.0 / props.frame_rate)?;
        Ok(spans
            .into_iter()
            .map(|span| Segment {
                index: span.index,
                start_time: span.start,
                end_time: span.end,
                raw_path: layout.raw_segment(span.index),
                processed_path: None,
            })
            .collect())
    }
}
