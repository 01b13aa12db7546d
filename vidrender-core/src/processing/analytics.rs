//! Analytics probe: read-only facts about a job's source.
//!
//! Probing never changes the job's status. Callers treat a failure as "no
//! analytics" and carry on.

use crate::error::CoreResult;
use crate::external::FfprobeExecutor;
use crate::job::VideoAnalytics;
use crate::utils::{aspect_ratio, round2};
use std::fs;
use std::path::Path;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Probes `source` and derives the reported figures.
pub fn probe_analytics(prober: &dyn FfprobeExecutor, source: &Path) -> CoreResult<VideoAnalytics> {
    let props = prober.probe(source)?;
    let size_bytes = fs::metadata(source)?.len();

    let duration = props.duration_secs;
    let total_frames = props
        .total_frames
        .unwrap_or_else(|| (duration * props.frame_rate).round().max(0.0) as u64);
    let bitrate_mbps = if duration > 0.0 {
        round2(size_bytes as f64 * 8.0 / (duration * 1_000_000.0))
    } else {
        0.0
    };

    Ok(VideoAnalytics {
        duration: round2(duration),
        width: props.width,
        height: props.height,
        fps: round2(props.frame_rate),
        file_size_mb: round2(size_bytes as f64 / BYTES_PER_MB),
        aspect_ratio: aspect_ratio(props.width, props.height),
        has_audio: props.has_audio,
        total_frames,
        bitrate_mbps,
        video_codec: props.video_codec,
    })
}
