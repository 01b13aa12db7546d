// ============================================================================
// vidrender-core/src/processing/executor.rs
// ============================================================================
//
// EXECUTORS: Sequential Baseline and Parallel Worker Pool
//
// Both passes apply the same filter to the same segments and hand back the
// processed paths in ascending index order together with the wall-clock time
// the pass took.
//
// The sequential pass walks the segments one at a time and stops on the first
// error. The parallel pass submits one task per segment to a dedicated rayon
// pool of N threads; workers report (index, result) over a channel and the
// collector reorders by index. The first error fails the pass; tasks already
// queued still run but their results are discarded.

// ---- External crate imports ----
use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

// ---- Internal crate imports ----
use super::filter_engine::SegmentFilter;
use crate::error::{CoreError, CoreResult, FilterError};
use crate::filters::FilterKind;
use crate::job::{ExecutionPass, JobLayout, Segment};

// ---- Standard library imports ----
use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

/// Result of one execution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    /// Processed segment paths, index `i` at position `i`.
    pub processed: Vec<PathBuf>,
    pub elapsed: Duration,
    pub workers: usize,
}

impl PassOutcome {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

// ============================================================================
// SEQUENTIAL
// ============================================================================

/// Filters every segment in ascending index order on the calling thread.
pub fn run_sequential(
    filter: &dyn SegmentFilter,
    segments: &[Segment],
    kind: FilterKind,
    layout: &JobLayout,
) -> CoreResult<PassOutcome> {
    fs::create_dir_all(layout.processed_dir(ExecutionPass::Sequential))?;

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.index);

    let start = Instant::now();
    let mut processed = Vec::with_capacity(ordered.len());
    for segment in ordered {
        let output = layout.processed_segment(ExecutionPass::Sequential, segment.index);
        processed.push(filter.apply(segment, kind, &output)?);
    }
    let elapsed = start.elapsed();

    info!(
        "Sequential pass: {} segment(s) in {:.2}s",
        processed.len(),
        elapsed.as_secs_f64()
    );
    Ok(PassOutcome {
        processed,
        elapsed,
        workers: 1,
    })
}

// ============================================================================
// PARALLEL
// ============================================================================

/// Fixed-size worker pool for the parallel pass.
pub struct ParallelExecutor {
    pool: ThreadPool,
    workers: usize,
}

impl ParallelExecutor {
    pub fn new(workers: usize) -> CoreResult<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("vidrender-worker-{i}"))
            .build()
            .map_err(|e| {
                CoreError::OperationFailed(format!("Failed to build worker pool: {e}"))
            })?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Filters every segment on the pool and returns the processed paths in
    /// index order.
    pub fn run(
        &self,
        filter: Arc<dyn SegmentFilter>,
        segments: &[Segment],
        kind: FilterKind,
        layout: &JobLayout,
    ) -> CoreResult<PassOutcome> {
        fs::create_dir_all(layout.processed_dir(ExecutionPass::Parallel))?;

        let expected = segments.len();
        let (tx, rx) = mpsc::channel::<(usize, Result<PathBuf, FilterError>)>();

        let start = Instant::now();
        for segment in segments {
            let tx = tx.clone();
            let filter = Arc::clone(&filter);
            let segment = segment.clone();
            let output = layout.processed_segment(ExecutionPass::Parallel, segment.index);
            self.pool.spawn(move || {
                let index = segment.index;
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    filter.apply(&segment, kind, &output)
                }))
                .unwrap_or_else(|_| Err(FilterError::new(index, "worker panicked")));
                // The collector may already have given up on this pass.
                let _ = tx.send((index, result));
            });
        }
        // Only worker-held senders remain; the channel closes when all tasks end.
        drop(tx);

        let mut completed: BTreeMap<usize, PathBuf> = BTreeMap::new();
        let mut first_error: Option<FilterError> = None;
        let mut last_result = start;
        for (index, result) in rx {
            last_result = Instant::now();
            match result {
                Ok(path) if first_error.is_none() => {
                    debug!("Segment {} finished on the pool", index);
                    completed.insert(index, path);
                }
                Ok(_) => {}
                Err(err) => {
                    if first_error.is_none() {
                        warn!("Parallel pass failed on segment {}: {}", index, err.cause);
                        first_error = Some(err);
                    }
                }
            }
        }
        let elapsed = last_result.duration_since(start);

        if let Some(err) = first_error {
            return Err(err.into());
        }

        let processed = reorder(completed, segments)?;
        debug_assert_eq!(processed.len(), expected);
        info!(
            "Parallel pass: {} segment(s) on {} worker(s) in {:.2}s",
            processed.len(),
            self.workers,
            elapsed.as_secs_f64()
        );
        Ok(PassOutcome {
            processed,
            elapsed,
            workers: self.workers,
        })
    }
}

/// Index-ordered paths, or a FilterError naming the first segment that never
/// reported.
fn reorder(mut completed: BTreeMap<usize, PathBuf>, segments: &[Segment]) -> CoreResult<Vec<PathBuf>> {
    let mut indices: Vec<usize> = segments.iter().map(|s| s.index).collect();
    indices.sort_unstable();

    let mut ordered = Vec::with_capacity(indices.len());
    for index in indices {
        match completed.remove(&index) {
            Some(path) => ordered.push(path),
            None => {
                return Err(FilterError::new(index, "worker exited without reporting a result").into());
            }
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn segment(index: usize) -> Segment {
        Segment {
            index,
            start_time: index as f64 * 10.0,
            end_time: (index + 1) as f64 * 10.0,
            raw_path: PathBuf::from(format!("/raw/{index}")),
            processed_path: None,
        }
    }

    #[test]
    fn reorder_restores_index_order() {
        let segments: Vec<Segment> = (0..4).map(segment).collect();
        let mut completed = BTreeMap::new();
        for i in [3, 1, 0, 2] {
            completed.insert(i, PathBuf::from(format!("/out/{i}")));
        }
        let ordered = reorder(completed, &segments).unwrap();
        assert_eq!(
            ordered,
            (0..4).map(|i| PathBuf::from(format!("/out/{i}"))).collect::<Vec<_>>()
        );
    }

    #[test]
    fn reorder_reports_missing_index() {
        let segments: Vec<Segment> = (0..3).map(segment).collect();
        let mut completed = BTreeMap::new();
        completed.insert(0, PathBuf::from("/out/0"));
        completed.insert(2, PathBuf::from("/out/2"));
        let err = reorder(completed, &segments).unwrap_err();
        assert!(matches!(err, CoreError::Filter(FilterError { segment_index: 1, .. })));
    }

    struct PanicsOn(usize);

    impl SegmentFilter for PanicsOn {
        fn apply(
            &self,
            segment: &Segment,
            _kind: FilterKind,
            output: &Path,
        ) -> Result<PathBuf, FilterError> {
            if segment.index == self.0 {
                panic!("decoder blew up");
            }
            Ok(output.to_path_buf())
        }
    }

    #[test]
    fn panicking_worker_becomes_filter_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path(), "job");
        let segments: Vec<Segment> = (0..4).map(segment).collect();
        let executor = ParallelExecutor::new(2).unwrap();

        let err = executor
            .run(Arc::new(PanicsOn(2)), &segments, FilterKind::Blur, &layout)
            .unwrap_err();
        assert!(matches!(err, CoreError::Filter(FilterError { segment_index: 2, .. })));
    }
}
