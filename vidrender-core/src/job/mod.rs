// ============================================================================
// vidrender-core/src/job/mod.rs
// ============================================================================
//
// JOB MODEL: Job Records, Status Machine and Segments
//
// A job is one uploaded video moving through the pipeline. Its status only
// ever moves forward through the stage order, or to `failed` from any
// non-terminal state.
//
// KEY COMPONENTS:
// - JobStatus: Closed set of pipeline states with the transition rule
// - Job: The record the status path reads
// - Segment: One fixed-length slice of the source
// - VideoAnalytics: Read-only facts about the source

// ---- External crate imports ----
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---- Internal crate imports ----
use crate::filters::FilterKind;

// ---- Standard library imports ----
use std::fmt;
use std::path::PathBuf;

pub mod layout;
pub mod store;

pub use layout::{ExecutionPass, JobLayout, validate_job_id};
pub use store::{JobStore, RetentionPolicy};

/// Opaque job identifier assigned by the upload collaborator.
pub type JobId = String;

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    Segmenting,
    RunningSequential,
    RunningParallel,
    Merging,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Segmenting => "segmenting",
            JobStatus::RunningSequential => "running_sequential",
            JobStatus::RunningParallel => "running_parallel",
            JobStatus::Merging => "merging",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` end a run.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// A run is in flight in every state between `segmenting` and `merging`.
    #[must_use]
    pub fn is_active(self) -> bool {
        !self.is_terminal() && self != JobStatus::Uploaded
    }

    /// Trigger guard: a run may start from `uploaded` or after a failure.
    #[must_use]
    pub fn is_startable(self) -> bool {
        matches!(self, JobStatus::Uploaded | JobStatus::Failed)
    }

    /// Position in the forward stage order. `failed` sits outside it.
    fn rank(self) -> Option<u8> {
        match self {
            JobStatus::Uploaded => Some(0),
            JobStatus::Segmenting => Some(1),
            JobStatus::RunningSequential => Some(2),
            JobStatus::RunningParallel => Some(3),
            JobStatus::Merging => Some(4),
            JobStatus::Completed => Some(5),
            JobStatus::Failed => None,
        }
    }

    /// Forward-only transition rule within a run: the next stage, or
    /// `failed` from any non-terminal state.
    #[must_use]
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Failed {
            return true;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to == from + 1,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One contiguous slice `[start_time, end_time)` of the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub raw_path: PathBuf,
    pub processed_path: Option<PathBuf>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Facts extracted from the source by the analytics probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalytics {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub file_size_mb: f64,
    /// Reduced `W:H`, e.g. `16:9`.
    pub aspect_ratio: String,
    pub has_audio: bool,
    pub total_frames: u64,
    pub bitrate_mbps: f64,
    pub video_codec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub source_path: PathBuf,
    pub source_size_bytes: u64,
    pub filter_kind: Option<FilterKind>,
    pub segments: Vec<Segment>,
    pub output_path: Option<PathBuf>,
    pub sequential_time: Option<f64>,
    pub parallel_time: Option<f64>,
    pub speedup: Option<f64>,
    pub workers_used: Option<usize>,
    pub analytics: Option<VideoAnalytics>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly uploaded job with no run attached.
    pub fn new(id: impl Into<JobId>, source_path: impl Into<PathBuf>, source_size_bytes: u64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Uploaded,
            source_path: source_path.into(),
            source_size_bytes,
            filter_kind: None,
            segments: Vec::new(),
            output_path: None,
            sequential_time: None,
            parallel_time: None,
            speedup: None,
            workers_used: None,
            analytics: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Drops everything a previous run produced so a new run starts clean.
    pub(crate) fn reset_run_fields(&mut self) {
        self.segments.clear();
        self.output_path = None;
        self.sequential_time = None;
        self.parallel_time = None;
        self.speedup = None;
        self.workers_used = None;
        self.error = None;
    }
}
