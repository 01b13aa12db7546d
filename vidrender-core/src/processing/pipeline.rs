// ============================================================================
// vidrender-core/src/processing/pipeline.rs
// ============================================================================
//
// PIPELINE ORCHESTRATOR: Drive One Job Through Every Stage
//
// Stage order is fixed:
//
//   segmenting -> running_sequential -> running_parallel -> merging -> completed
//
// Each transition is written to the job store before the stage's work
// starts, so a status reader always sees the stage that is running. Any stage
// error is recorded on the job together with the stage name and the job moves
// to `failed`; nothing is retried.
//
// KEY COMPONENTS:
// - Toolchain: The injected segmenter, filter, merger and prober
// - Pipeline: Runs a job that has already been claimed in the store

// ---- External crate imports ----
use log::{debug, info, warn};

// ---- Internal crate imports ----
use super::analytics::probe_analytics;
use super::executor::{ParallelExecutor, PassOutcome, run_sequential};
use super::filter_engine::{FfmpegSegmentFilter, SegmentFilter};
use super::merger::{ConcatMerger, SegmentMerger};
use super::segmenter::{FfmpegSegmenter, Segmenter};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{CrateFfprobeExecutor, FfprobeExecutor};
use crate::filters::FilterKind;
use crate::job::store::CompletedRun;
use crate::job::{ExecutionPass, Job, JobLayout, JobStatus, JobStore};
use crate::utils::speedup;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The external collaborators a run uses. Production code uses
/// [`Toolchain::ffmpeg`]; tests substitute fakes.
#[derive(Clone)]
pub struct Toolchain {
    pub prober: Arc<dyn FfprobeExecutor>,
    pub segmenter: Arc<dyn Segmenter>,
    pub filter: Arc<dyn SegmentFilter>,
    pub merger: Arc<dyn SegmentMerger>,
}

impl Toolchain {
    /// ffprobe/ffmpeg-backed components configured from `config`.
    pub fn ffmpeg(config: &CoreConfig) -> Self {
        let prober: Arc<dyn FfprobeExecutor> = Arc::new(CrateFfprobeExecutor::new());
        Self {
            segmenter: Arc::new(FfmpegSegmenter::new(
                Arc::clone(&prober),
                config.segment_duration_secs,
                config.encoder.clone(),
            )),
            filter: Arc::new(FfmpegSegmentFilter::new(
                Arc::clone(&prober),
                config.encoder.clone(),
            )),
            merger: Arc::new(ConcatMerger::new(config.merge.clone())),
            prober,
        }
    }
}

/// Runs claimed jobs to completion or failure.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<CoreConfig>,
    store: Arc<JobStore>,
    tools: Toolchain,
}

impl Pipeline {
    pub fn new(config: Arc<CoreConfig>, store: Arc<JobStore>, tools: Toolchain) -> Self {
        Self {
            config,
            store,
            tools,
        }
    }

    pub fn layout(&self, job_id: &str) -> JobLayout {
        JobLayout::new(&self.config.workspace_dir, job_id)
    }

    /// Runs a job already moved to `segmenting` by the store's claim.
    ///
    /// Returns the final snapshot on success. On failure the error has already
    /// been written to the job and is also returned.
    pub fn run(&self, job_id: &str) -> CoreResult<Job> {
        let job = self.store.get(job_id)?;
        let kind = job.filter_kind.ok_or_else(|| {
            CoreError::OperationFailed(format!("job {job_id} was started without a filter"))
        })?;
        let layout = self.layout(job_id);

        info!("Job {}: starting {} run on {}", job_id, kind, job.source_path.display());

        let result = self.execute(&job, kind, &layout);
        if !self.config.keep_intermediates {
            remove_intermediates(&layout);
        }

        match result {
            Ok(()) => {
                let done = self.store.get(job_id)?;
                info!(
                    "Job {}: completed, speedup {:.2}x on {} worker(s)",
                    job_id,
                    done.speedup.unwrap_or(1.0),
                    done.workers_used.unwrap_or(1)
                );
                Ok(done)
            }
            Err((stage, err)) => {
                let message = format!("{stage}: {err}");
                warn!("Job {}: failed during {}: {}", job_id, stage, err);
                // A partial output must never be served.
                let _ = fs::remove_dir_all(layout.output_dir());
                if let Err(e) = self.store.fail(job_id, message) {
                    warn!("Job {}: could not record failure: {}", job_id, e);
                }
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        job: &Job,
        kind: FilterKind,
        layout: &JobLayout,
    ) -> Result<(), (JobStatus, CoreError)> {
        let id = job.id.as_str();

        // ---- segmenting ----
        let stage = JobStatus::Segmenting;
        let segments = self
            .tools
            .segmenter
            .segment(&job.source_path, layout)
            .map_err(|e| (stage, e))?;
        info!("Job {}: {} segment(s)", id, segments.len());
        self.store
            .set_segments(id, segments.clone())
            .map_err(|e| (stage, e))?;

        // ---- running_sequential ----
        let stage = self.enter(id, JobStatus::RunningSequential)?;
        let sequential = run_sequential(self.tools.filter.as_ref(), &segments, kind, layout)
            .map_err(|e| (stage, e))?;
        // Baseline output is only timed, never merged.
        if !self.config.keep_intermediates {
            let _ = fs::remove_dir_all(layout.processed_dir(ExecutionPass::Sequential));
        }

        // ---- running_parallel ----
        let stage = self.enter(id, JobStatus::RunningParallel)?;
        let executor =
            ParallelExecutor::new(self.config.effective_workers()).map_err(|e| (stage, e))?;
        let parallel = executor
            .run(Arc::clone(&self.tools.filter), &segments, kind, layout)
            .map_err(|e| (stage, e))?;

        // ---- merging ----
        let stage = self.enter(id, JobStatus::Merging)?;
        self.store
            .set_processed_paths(id, &parallel.processed)
            .map_err(|e| (stage, e))?;
        let audio_source = self.audio_source(job);
        let output = self
            .tools
            .merger
            .merge(&parallel.processed, audio_source, &layout.output_file())
            .map_err(|e| (stage, e))?;

        // Analytics are best effort and never fail the job.
        if self.store.get(id).map(|j| j.analytics.is_none()).unwrap_or(false) {
            self.refresh_analytics(id, &job.source_path);
        }

        self.store
            .complete(id, completed_run(output, &sequential, &parallel))
            .map_err(|e| (stage, e))?;
        Ok(())
    }

    fn enter(&self, id: &str, next: JobStatus) -> Result<JobStatus, (JobStatus, CoreError)> {
        self.store.advance(id, next).map_err(|e| (next, e))?;
        info!("Job {}: {}", id, next);
        Ok(next)
    }

    /// Source to take audio from, decided by analytics or a direct probe.
    fn audio_source<'a>(&self, job: &'a Job) -> Option<&'a Path> {
        let has_audio = match self.store.get(&job.id).ok().and_then(|j| j.analytics) {
            Some(analytics) => analytics.has_audio,
            None => match self.tools.prober.probe(&job.source_path) {
                Ok(props) => props.has_audio,
                Err(e) => {
                    debug!("Job {}: audio probe failed, merging without audio: {}", job.id, e);
                    false
                }
            },
        };
        has_audio.then_some(job.source_path.as_path())
    }

    /// Probes the source and stores analytics; failures are logged only.
    pub fn refresh_analytics(&self, id: &str, source: &Path) {
        match probe_analytics(self.tools.prober.as_ref(), source) {
            Ok(analytics) => {
                if let Err(e) = self.store.set_analytics(id, analytics) {
                    warn!("Job {}: could not store analytics: {}", id, e);
                }
            }
            Err(e) => warn!("Job {}: analytics unavailable: {}", id, e),
        }
    }
}

fn completed_run(output: PathBuf, sequential: &PassOutcome, parallel: &PassOutcome) -> CompletedRun {
    let sequential_time = sequential.elapsed_secs();
    let parallel_time = parallel.elapsed_secs();
    CompletedRun {
        output_path: output,
        sequential_time,
        parallel_time,
        speedup: speedup(sequential_time, parallel_time, parallel.workers),
        workers_used: parallel.workers,
    }
}

fn remove_intermediates(layout: &JobLayout) {
    for dir in [layout.raw_dir(), layout.processed_root()] {
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!("Could not remove {}: {}", dir.display(), e);
            }
        }
    }
}
