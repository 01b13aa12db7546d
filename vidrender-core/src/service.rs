// ============================================================================
// vidrender-core/src/service.rs
// ============================================================================
//
// SERVICE: The Operations Exposed to an Outer Surface
//
// VideoRenderService is what a transport (HTTP handler, CLI, ...) talks to:
// register an uploaded file, trigger a run, poll status, fetch the output,
// and remove or expire finished jobs. Runs execute on their own named thread;
// the trigger returns as soon as the job is claimed.
//
// Request errors (not found, conflict, invalid filter, not ready, duplicate)
// are returned without touching job state.

// ---- External crate imports ----
use chrono::Utc;
use log::{error, info, warn};

// ---- Internal crate imports ----
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::filters::FilterKind;
use crate::job::{Job, JobLayout, JobStatus, JobStore, validate_job_id};
use crate::processing::{Pipeline, Toolchain};

// ---- Standard library imports ----
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A run started by [`VideoRenderService::start_processing`].
#[derive(Debug)]
pub struct RunHandle {
    job_id: String,
    handle: JoinHandle<CoreResult<Job>>,
}

impl RunHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run. The job record reflects the outcome either way.
    pub fn join(self) -> CoreResult<Job> {
        self.handle.join().map_err(|_| {
            CoreError::OperationFailed(format!("run thread for job {} panicked", self.job_id))
        })?
    }
}

pub struct VideoRenderService {
    config: Arc<CoreConfig>,
    store: Arc<JobStore>,
    pipeline: Pipeline,
}

impl VideoRenderService {
    /// Service using ffmpeg and ffprobe.
    pub fn new(config: CoreConfig) -> CoreResult<Self> {
        let tools = Toolchain::ffmpeg(&config);
        Self::with_toolchain(config, tools)
    }

    /// Service with injected collaborators.
    pub fn with_toolchain(mut config: CoreConfig, tools: Toolchain) -> CoreResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.workspace_dir)?;
        config.workspace_dir = fs::canonicalize(&config.workspace_dir)?;

        let store = match &config.state_file {
            Some(path) => JobStore::with_state_file(path)?,
            None => JobStore::new(),
        };
        let config = Arc::new(config);
        let store = Arc::new(store);
        let pipeline = Pipeline::new(Arc::clone(&config), Arc::clone(&store), tools);

        info!(
            "Job service ready: workspace {}, {} worker(s), {}s segments",
            config.workspace_dir.display(),
            config.effective_workers(),
            config.segment_duration_secs
        );
        Ok(Self {
            config,
            store,
            pipeline,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn available_filters() -> &'static [FilterKind] {
        &FilterKind::ALL
    }

    // ---- Create job ----

    /// Registers an uploaded file as a new job in `uploaded` and probes its
    /// analytics. A failed probe leaves analytics unset. The id becomes a
    /// directory name, so anything but a single plain path component is
    /// rejected.
    pub fn create_job(
        &self,
        job_id: &str,
        source_path: impl Into<PathBuf>,
        size_bytes: u64,
    ) -> CoreResult<Job> {
        validate_job_id(job_id)?;
        let source_path = source_path.into();
        self.store
            .insert(Job::new(job_id, source_path.clone(), size_bytes))?;
        info!("Job {}: created for {}", job_id, source_path.display());

        self.pipeline.refresh_analytics(job_id, &source_path);
        self.store.get(job_id)
    }

    // ---- Trigger processing ----

    /// Validates the filter, claims the job and starts the run in the
    /// background.
    pub fn start_processing(&self, job_id: &str, filter: &str) -> CoreResult<RunHandle> {
        let kind: FilterKind = filter.parse()?;
        self.store.claim_for_run(job_id, kind)?;

        let pipeline = self.pipeline.clone();
        let store = Arc::clone(&self.store);
        let config = Arc::clone(&self.config);
        let id = job_id.to_string();

        let spawned = thread::Builder::new()
            .name(format!("vidrender-job-{job_id}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&id)))
                    .unwrap_or_else(|_| {
                        error!("Job {}: run panicked", id);
                        let _ = store.fail(&id, "run panicked");
                        Err(CoreError::OperationFailed(format!("run for job {id} panicked")))
                    });
                prune_with(&store, &config);
                result
            });

        match spawned {
            Ok(handle) => Ok(RunHandle {
                job_id: job_id.to_string(),
                handle,
            }),
            Err(e) => {
                let message = format!("could not start run: {e}");
                let _ = self.store.fail(job_id, message.clone());
                Err(CoreError::OperationFailed(message))
            }
        }
    }

    // ---- Query status ----

    pub fn job_status(&self, job_id: &str) -> CoreResult<Job> {
        self.store.get(job_id)
    }

    pub fn list_jobs(&self) -> Vec<Job> {
        self.store.list()
    }

    // ---- Fetch output ----

    /// Output location of a completed job.
    pub fn output_path(&self, job_id: &str) -> CoreResult<PathBuf> {
        let job = self.store.get(job_id)?;
        match (job.status, job.output_path) {
            (JobStatus::Completed, Some(path)) => Ok(path),
            (status, _) => Err(CoreError::NotReady {
                job_id: job_id.to_string(),
                status,
            }),
        }
    }

    // ---- Cleanup ----

    /// Deletes a job and everything under its workspace directory.
    pub fn remove_job(&self, job_id: &str) -> CoreResult<()> {
        self.store.remove(job_id)?;
        remove_job_dir(&self.config.workspace_dir, job_id);
        info!("Job {}: removed", job_id);
        Ok(())
    }

    /// Applies the retention policy now and returns the evicted job ids.
    pub fn prune_expired(&self) -> CoreResult<Vec<String>> {
        prune(&self.store, &self.config)
    }
}

fn prune(store: &JobStore, config: &CoreConfig) -> CoreResult<Vec<String>> {
    let evicted = store.prune(&config.retention, Utc::now())?;
    let ids: Vec<String> = evicted.into_iter().map(|job| job.id).collect();
    for id in &ids {
        remove_job_dir(&config.workspace_dir, id);
        info!("Job {}: evicted by retention policy", id);
    }
    Ok(ids)
}

fn prune_with(store: &JobStore, config: &CoreConfig) {
    if let Err(e) = prune(store, config) {
        warn!("Retention pass failed: {}", e);
    }
}

fn remove_job_dir(workspace: &Path, job_id: &str) {
    // Records restored from a hand-edited state file skip create_job.
    if let Err(e) = validate_job_id(job_id) {
        warn!("Not removing files of job {}: {}", job_id, e);
        return;
    }
    let layout = JobLayout::new(workspace, job_id);
    let root = layout.root();
    if root.exists() {
        if let Err(e) = fs::remove_dir_all(root) {
            warn!("Could not remove {}: {}", root.display(), e);
        }
    }
}
