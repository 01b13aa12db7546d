// Shared fakes for pipeline tests. They stand in for ffprobe/ffmpeg so the
// orchestration, ordering and state machine can be exercised without media
// tools installed.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use vidrender_core::error::{CoreError, CoreResult, FilterError};
use vidrender_core::external::{FfprobeExecutor, SourceProperties};
use vidrender_core::filters::FilterKind;
use vidrender_core::job::{JobLayout, Segment};
use vidrender_core::processing::merger::check_segments;
use vidrender_core::processing::{SegmentFilter, SegmentMerger, Segmenter, Toolchain, plan_segments};

// ---- Prober ----

pub struct FakeProber {
    pub props: Option<SourceProperties>,
}

impl FakeProber {
    pub fn with_duration(duration_secs: f64, has_audio: bool) -> Self {
        Self {
            props: Some(SourceProperties {
                duration_secs,
                width: 1280,
                height: 720,
                frame_rate: 25.0,
                total_frames: Some((duration_secs * 25.0) as u64),
                has_audio,
                video_codec: Some("h264".to_string()),
            }),
        }
    }

    pub fn broken() -> Self {
        Self { props: None }
    }
}

impl FfprobeExecutor for FakeProber {
    fn probe(&self, input_path: &Path) -> CoreResult<SourceProperties> {
        self.props.clone().ok_or_else(|| CoreError::Probe {
            path: input_path.display().to_string(),
            message: "not a video".to_string(),
        })
    }
}

// ---- Segmenter ----

/// Writes `raw:{index}` files on the real segment boundaries.
pub struct FakeSegmenter {
    pub duration: f64,
    pub segment_len: f64,
}

impl Segmenter for FakeSegmenter {
    fn segment(&self, _source: &Path, layout: &JobLayout) -> CoreResult<Vec<Segment>> {
        let spans = plan_segments(self.duration, self.segment_len)?;
        fs::create_dir_all(layout.raw_dir())?;
        let mut segments = Vec::new();
        for span in spans {
            let raw_path = layout.raw_segment(span.index);
            fs::write(&raw_path, format!("raw:{}", span.index))?;
            segments.push(Segment {
                index: span.index,
                start_time: span.start,
                end_time: span.end,
                raw_path,
                processed_path: None,
            });
        }
        Ok(segments)
    }
}

// ---- Filter ----

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailMode {
    Never,
    /// Fails this segment in every pass.
    Always(usize),
    /// Fails this segment only in the parallel pass.
    ParallelOnly(usize),
}

/// Writes `{kind}({raw contents})`. Lower indices sleep longer so parallel
/// completion order is the reverse of index order.
pub struct FakeFilter {
    pub segment_count: usize,
    pub step: Duration,
    pub fail: FailMode,
    pub completions: Mutex<Vec<usize>>,
}

impl FakeFilter {
    pub fn new(segment_count: usize) -> Self {
        Self {
            segment_count,
            step: Duration::from_millis(20),
            fail: FailMode::Never,
            completions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(segment_count: usize, fail: FailMode) -> Self {
        Self {
            fail,
            ..Self::new(segment_count)
        }
    }

    pub fn completion_order(&self) -> Vec<usize> {
        self.completions.lock().unwrap().clone()
    }
}

impl SegmentFilter for FakeFilter {
    fn apply(
        &self,
        segment: &Segment,
        kind: FilterKind,
        output: &Path,
    ) -> Result<PathBuf, FilterError> {
        let weight = self.segment_count.saturating_sub(segment.index).max(1) as u32;
        thread::sleep(self.step * weight);

        let parallel = output.to_string_lossy().contains("parallel");
        let fails = match self.fail {
            FailMode::Never => false,
            FailMode::Always(i) => i == segment.index,
            FailMode::ParallelOnly(i) => parallel && i == segment.index,
        };
        if fails {
            return Err(FilterError::new(segment.index, "synthetic decoder failure"));
        }

        let raw = fs::read_to_string(&segment.raw_path)
            .map_err(|e| FilterError::new(segment.index, e.to_string()))?;
        fs::write(output, format!("{kind}({raw})"))
            .map_err(|e| FilterError::new(segment.index, e.to_string()))?;
        self.completions.lock().unwrap().push(segment.index);
        Ok(output.to_path_buf())
    }
}

// ---- Merger ----

/// Joins segment contents with `|`, appending `+audio` when audio is kept.
pub struct ByteConcatMerger;

impl SegmentMerger for ByteConcatMerger {
    fn merge(
        &self,
        segments: &[PathBuf],
        audio_source: Option<&Path>,
        output: &Path,
    ) -> CoreResult<PathBuf> {
        check_segments(segments)?;
        let mut parts = Vec::new();
        for path in segments {
            parts.push(fs::read_to_string(path)?);
        }
        let mut merged = parts.join("|");
        if audio_source.is_some() {
            merged.push_str("+audio");
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, merged)?;
        Ok(output.to_path_buf())
    }
}

// ---- Assembly ----

pub fn toolchain(
    prober: FakeProber,
    duration: f64,
    filter: Arc<FakeFilter>,
) -> Toolchain {
    Toolchain {
        prober: Arc::new(prober),
        segmenter: Arc::new(FakeSegmenter {
            duration,
            segment_len: 10.0,
        }),
        filter,
        merger: Arc::new(ByteConcatMerger),
    }
}

/// Creates an upload file so analytics have something to size.
pub fn upload(dir: &Path, name: &str) -> (PathBuf, u64) {
    let path = dir.join(name);
    let bytes = vec![7u8; 4096];
    fs::write(&path, &bytes).unwrap();
    (path, bytes.len() as u64)
}
