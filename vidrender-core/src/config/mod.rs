// ============================================================================
// vidrender-core/src/config/mod.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Defaults
//
// This module defines the configuration for the job pipeline: where job
// files are written, how long segments are, how many workers the parallel
// pass uses, how processed segments are encoded, and which finished jobs may
// be evicted.
//
// KEY COMPONENTS:
// - CoreConfig: Main configuration structure
// - EncoderSettings: Fixed encoder parameters for processed segments
// - MergeOptions: Container and audio settings of the merged output
// - Default constants
// - CoreConfigBuilder: Fluent construction (see builder.rs)

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::job::RetentionPolicy;

// ---- Standard library imports ----
use std::path::PathBuf;

mod builder;

pub use builder::CoreConfigBuilder;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Fixed segment length in seconds.
pub const DEFAULT_SEGMENT_DURATION_SECS: f64 = 10.0;

/// Video encoder for raw and processed segments.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// x264 preset for raw and processed segments.
pub const DEFAULT_ENCODER_PRESET: &str = "veryfast";

/// x264 CRF for raw and processed segments.
pub const DEFAULT_ENCODER_CRF: u8 = 20;

/// Codec the source audio is re-encoded with when merged back.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Threads per encoder process. One keeps output bit-identical across runs
/// and leaves the worker pool as the only source of parallelism.
pub const DEFAULT_ENCODER_THREADS: usize = 1;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Encoder parameters shared by the segmenter and the filter engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub threads: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_ENCODER_PRESET.to_string(),
            crf: DEFAULT_ENCODER_CRF,
            threads: DEFAULT_ENCODER_THREADS,
        }
    }
}

/// Options for segment merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Add faststart flag for web playback (MP4)
    pub faststart: bool,
    /// Codec the restored audio track is encoded with
    pub audio_codec: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            faststart: true,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
        }
    }
}

/// Main configuration for the job pipeline.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Root under which every job gets `{workspace_dir}/{job_id}`.
    pub workspace_dir: PathBuf,

    /// Segment length in seconds; the final segment may be shorter.
    pub segment_duration_secs: f64,

    /// Parallel pool size. `None` uses every available core.
    pub worker_count: Option<usize>,

    pub encoder: EncoderSettings,

    pub merge: MergeOptions,

    /// Keep raw and processed segments after a successful run.
    pub keep_intermediates: bool,

    /// JSON file the job store is persisted to, if any.
    pub state_file: Option<PathBuf>,

    pub retention: RetentionPolicy,
}

impl CoreConfig {
    /// Configuration with defaults rooted at `workspace_dir`.
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            segment_duration_secs: DEFAULT_SEGMENT_DURATION_SECS,
            worker_count: None,
            encoder: EncoderSettings::default(),
            merge: MergeOptions::default(),
            keep_intermediates: false,
            state_file: None,
            retention: RetentionPolicy::keep_all(),
        }
    }

    /// Number of workers the parallel pass will run with.
    pub fn effective_workers(&self) -> usize {
        self.worker_count.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Checks values that would otherwise fail deep inside a run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.workspace_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("workspace directory is empty".into()));
        }
        if !self.segment_duration_secs.is_finite() || self.segment_duration_secs <= 0.0 {
            return Err(CoreError::Config(format!(
                "segment duration must be positive, got {}",
                self.segment_duration_secs
            )));
        }
        if self.worker_count == Some(0) {
            return Err(CoreError::Config("worker count must be at least 1".into()));
        }
        if self.encoder.threads == 0 {
            return Err(CoreError::Config("encoder threads must be at least 1".into()));
        }
        if self.encoder.crf > 51 {
            return Err(CoreError::Config(format!(
                "CRF must be in 0..=51, got {}",
                self.encoder.crf
            )));
        }
        if self.encoder.video_codec.trim().is_empty() {
            return Err(CoreError::Config("video codec is empty".into()));
        }
        if self.merge.audio_codec.trim().is_empty() {
            return Err(CoreError::Config("audio codec is empty".into()));
        }
        Ok(())
    }
}
