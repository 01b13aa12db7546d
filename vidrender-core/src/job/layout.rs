// ============================================================================
// vidrender-core/src/job/layout.rs
// ============================================================================
//
// JOB LAYOUT: Deterministic On-Disk Paths for a Job
//
// Every path is a pure function of the workspace root, the job id and, for
// segments, the segment index. Nothing is shared between jobs.
//
//   {workspace}/{job_id}/raw/segment_{index:03}.mp4
//   {workspace}/{job_id}/processed/{sequential|parallel}/segment_{index:03}.mp4
//   {workspace}/{job_id}/output/{job_id}_processed.mp4

use crate::error::{CoreError, CoreResult};

use std::fmt;
use std::path::{Path, PathBuf};

/// Longest job id accepted.
pub const MAX_JOB_ID_LEN: usize = 128;

/// Which execution pass produced a processed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPass {
    Sequential,
    Parallel,
}

impl ExecutionPass {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionPass::Sequential => "sequential",
            ExecutionPass::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    root: PathBuf,
    job_id: String,
}

impl JobLayout {
    pub fn new(workspace: &Path, job_id: &str) -> Self {
        Self {
            root: workspace.join(job_id),
            job_id: job_id.to_string(),
        }
    }

    /// `{workspace}/{job_id}`; removing it removes everything the job wrote.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn raw_segment(&self, index: usize) -> PathBuf {
        self.raw_dir().join(segment_file_name(index))
    }

    pub fn processed_root(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn processed_dir(&self, pass: ExecutionPass) -> PathBuf {
        self.processed_root().join(pass.as_str())
    }

    pub fn processed_segment(&self, pass: ExecutionPass, index: usize) -> PathBuf {
        self.processed_dir(pass).join(segment_file_name(index))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn output_file(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}_processed.mp4", self.job_id))
    }
}

/// Accepts ids that name exactly one directory under the workspace: 1 to
/// [`MAX_JOB_ID_LEN`] ASCII letters, digits, `-` or `_`. Rules out `.`, `..`,
/// separators and absolute paths.
pub fn validate_job_id(job_id: &str) -> CoreResult<()> {
    let well_formed = !job_id.is_empty()
        && job_id.len() <= MAX_JOB_ID_LEN
        && job_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::InvalidJobId(job_id.to_string()))
    }
}

/// `segment_007.mp4`
pub fn segment_file_name(index: usize) -> String {
    format!("segment_{index:03}.mp4")
}
