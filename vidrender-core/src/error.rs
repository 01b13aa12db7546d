// ============================================================================
// vidrender-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for vidrender-core
//
// This module defines the error taxonomy of the job pipeline. Stage failures
// (segmentation, filtering, merging) are recorded on the job; request errors
// (not found, conflict, invalid filter, not ready, duplicate, bad job id) are
// returned to the caller and never touch job state.
//
// KEY COMPONENTS:
// - CoreError: Main error enum for all pipeline and service operations
// - FilterError: Per-segment filter failure carrying the segment index
// - CoreResult: Type alias for Result with CoreError
// - Helper functions for external command errors

// ---- External crate imports ----
use thiserror::Error;

// ---- Internal crate imports ----
use crate::job::JobStatus;

// ---- Standard library imports ----
use std::io;
use std::process::ExitStatus;

/// A filter failure on one segment. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("filter failed on segment {segment_index}: {cause}")]
pub struct FilterError {
    pub segment_index: usize,
    pub cause: String,
}

impl FilterError {
    pub fn new(segment_index: usize, cause: impl Into<String>) -> Self {
        Self {
            segment_index,
            cause: cause.into(),
        }
    }
}

/// Main error type for vidrender-core.
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- Pipeline stage errors ----
    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Merge failed: {0}")]
    Merge(String),

    // ---- Request errors ----
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} cannot be started while {status}")]
    Conflict { job_id: String, status: JobStatus },

    #[error("Invalid filter '{name}'. Valid filters: {valid}")]
    InvalidFilter { name: String, valid: String },

    #[error("Output of job {job_id} is not ready (status: {status})")]
    NotReady { job_id: String, status: JobStatus },

    #[error("Job already exists: {0}")]
    DuplicateJob(String),

    #[error("Invalid job id '{0}': use 1-128 ASCII letters, digits, '-' or '_'")]
    InvalidJobId(String),

    #[error("Invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    // ---- External tools ----
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to probe {path}: {message}")]
    Probe { path: String, message: String },

    #[error("Failed to start {command}: {source}")]
    CommandStart {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed waiting for {command}: {source}")]
    CommandWait {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    // ---- Configuration / misc ----
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for vidrender-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Error for a command that could not be spawned.
pub fn command_start_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandStart {
        command: command.into(),
        source,
    }
}

/// Error for a command that ran but exited unsuccessfully.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.into(),
        status,
        stderr: stderr.into(),
    }
}

/// Error for a command whose exit status could not be collected.
pub fn command_wait_error(command: impl Into<String>, source: io::Error) -> CoreError {
    CoreError::CommandWait {
        command: command.into(),
        source,
    }
}
