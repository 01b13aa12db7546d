//! Core library for the vidrender segmented video filter pipeline.
//!
//! An uploaded video is cut into fixed-length segments, a pixel filter is
//! applied to every segment twice (once sequentially as a baseline, once on
//! a worker pool sized to the host's cores), and the parallel output is
//! merged back into one file with the source audio. Jobs move through a
//! forward-only state machine held in a concurrent [`JobStore`] that status
//! readers can poll while a run is in flight.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidrender_core::{CoreConfigBuilder, VideoRenderService};
//!
//! let config = CoreConfigBuilder::new("/var/lib/vidrender")
//!     .worker_count(8)
//!     .build()
//!     .unwrap();
//! let service = VideoRenderService::new(config).unwrap();
//!
//! service.create_job("job-1", "/uploads/clip.mp4", 12_345_678).unwrap();
//! let run = service.start_processing("job-1", "sepia").unwrap();
//! let job = run.join().unwrap();
//! println!("speedup {:.2}x", job.speedup.unwrap_or(1.0));
//! println!("output at {}", service.output_path("job-1").unwrap().display());
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod filters;
pub mod job;
pub mod processing;
pub mod service;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder, EncoderSettings, MergeOptions};
pub use error::{CoreError, CoreResult, FilterError};
pub use external::check_dependency;
pub use filters::FilterKind;
pub use job::{
    ExecutionPass, Job, JobLayout, JobStatus, JobStore, RetentionPolicy, Segment, VideoAnalytics,
    validate_job_id,
};
pub use processing::{Pipeline, Toolchain};
pub use service::{RunHandle, VideoRenderService};
pub use utils::{format_bytes, format_duration};
