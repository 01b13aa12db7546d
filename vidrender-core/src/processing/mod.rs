// ============================================================================
// vidrender-core/src/processing/mod.rs
// ============================================================================
//
// PROCESSING: The Job Pipeline Stages
//
// Leaves first: the segmenter cuts the source, the filter engine processes
// one segment, the executors run the filter over all segments sequentially
// and on the worker pool, the merger joins the parallel output, and the
// analytics probe reads the source. The pipeline ties them together.

pub mod analytics;
pub mod executor;
pub mod filter_engine;
pub mod merger;
pub mod pipeline;
pub mod segmenter;

pub use analytics::probe_analytics;
pub use executor::{ParallelExecutor, PassOutcome, run_sequential};
pub use filter_engine::{FfmpegSegmentFilter, SegmentFilter};
pub use merger::{ConcatMerger, SegmentMerger};
pub use pipeline::{Pipeline, Toolchain};
pub use segmenter::{FfmpegSegmenter, SegmentSpan, Segmenter, plan_segments};
