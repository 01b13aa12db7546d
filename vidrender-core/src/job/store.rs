// ============================================================================
// vidrender-core/src/job/store.rs
// ============================================================================
//
// JOB STORE: Concurrent Job Registry with Optional JSON Persistence
//
// The store is the only state shared between job control paths and status
// readers. Every mutation runs as one closure under the write lock against a
// copy of the record, and the copy replaces the record only if the closure
// succeeds, so readers never observe a torn or half-applied update.
//
// When a state file is configured, the whole registry is rewritten after
// every mutation (atomic rename through tempfile). Mutators are serialized on
// a separate lock so snapshots land on disk in mutation order.

// ---- External crate imports ----
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tempfile::NamedTempFile;

// ---- Internal crate imports ----
use super::{Job, JobId, JobStatus, Segment, VideoAnalytics};
use crate::error::{CoreError, CoreResult};
use crate::filters::FilterKind;

// ---- Standard library imports ----
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

/// Which finished jobs may be evicted. Active jobs are never evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Evict finished jobs whose last update is older than this.
    pub max_age: Option<Duration>,
    /// Keep at most this many finished jobs, newest first.
    pub max_finished_jobs: Option<usize>,
}

impl RetentionPolicy {
    /// Never evicts anything.
    pub fn keep_all() -> Self {
        Self::default()
    }

    pub fn is_keep_all(&self) -> bool {
        self.max_age.is_none() && self.max_finished_jobs.is_none()
    }
}

/// Everything written together with the transition to `completed`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    pub output_path: PathBuf,
    pub sequential_time: f64,
    pub parallel_time: f64,
    pub speedup: f64,
    pub workers_used: usize,
}

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    state_file: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl JobStore {
    /// In-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a JSON state file. Existing records are loaded; jobs
    /// caught mid-run by a restart are marked failed.
    pub fn with_state_file(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let mut jobs = HashMap::new();

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let records: Vec<Job> = if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents)?
            };
            let now = Utc::now();
            for mut job in records {
                if job.status.is_active() {
                    warn!(
                        "Job {} was {} when the previous process stopped; marking failed",
                        job.id, job.status
                    );
                    job.error = Some(format!("interrupted during {}", job.status));
                    job.status = JobStatus::Failed;
                    job.updated_at = now;
                }
                jobs.insert(job.id.clone(), job);
            }
            info!("Loaded {} job(s) from {}", jobs.len(), path.display());
        }

        Ok(Self {
            jobs: RwLock::new(jobs),
            state_file: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    // ---- Reads ----

    /// Whole-record snapshot of one job.
    pub fn get(&self, id: &str) -> CoreResult<Job> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.contains_key(id)
    }

    /// Snapshots of every job, oldest first.
    pub fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- Writes ----

    pub fn insert(&self, job: Job) -> CoreResult<()> {
        let id = job.id.clone();
        self.write(|jobs| {
            if jobs.contains_key(&id) {
                return Err(CoreError::DuplicateJob(id.clone()));
            }
            jobs.insert(id.clone(), job);
            Ok(())
        })?;
        debug!("Registered job {}", id);
        Ok(())
    }

    /// Check-and-claim for a new run. Only `uploaded` and `failed` jobs can
    /// be claimed; the claimed job is reset, gets its filter and moves to
    /// `segmenting` in the same write.
    pub fn claim_for_run(&self, id: &str, filter_kind: FilterKind) -> CoreResult<Job> {
        self.update(id, |job| {
            if !job.status.is_startable() {
                return Err(CoreError::Conflict {
                    job_id: job.id.clone(),
                    status: job.status,
                });
            }
            job.reset_run_fields();
            job.filter_kind = Some(filter_kind);
            job.status = JobStatus::Segmenting;
            Ok(job.clone())
        })
    }

    /// Moves a job one stage forward.
    pub fn advance(&self, id: &str, next: JobStatus) -> CoreResult<()> {
        self.update(id, |job| {
            transition(job, next)?;
            Ok(())
        })
    }

    pub fn set_segments(&self, id: &str, segments: Vec<Segment>) -> CoreResult<()> {
        self.update(id, |job| {
            job.segments = segments;
            Ok(())
        })
    }

    /// Records the processed file of every segment, in index order.
    pub fn set_processed_paths(&self, id: &str, paths: &[PathBuf]) -> CoreResult<()> {
        self.update(id, |job| {
            if paths.len() != job.segments.len() {
                return Err(CoreError::OperationFailed(format!(
                    "job {} has {} segments but {} processed paths were reported",
                    job.id,
                    job.segments.len(),
                    paths.len()
                )));
            }
            for (segment, path) in job.segments.iter_mut().zip(paths) {
                segment.processed_path = Some(path.clone());
            }
            Ok(())
        })
    }

    pub fn set_analytics(&self, id: &str, analytics: VideoAnalytics) -> CoreResult<()> {
        self.update(id, |job| {
            job.analytics = Some(analytics);
            Ok(())
        })
    }

    /// Output and timings become visible together with `completed`.
    pub fn complete(&self, id: &str, run: CompletedRun) -> CoreResult<()> {
        self.update(id, |job| {
            transition(job, JobStatus::Completed)?;
            job.output_path = Some(run.output_path);
            job.sequential_time = Some(run.sequential_time);
            job.parallel_time = Some(run.parallel_time);
            job.speedup = Some(run.speedup);
            job.workers_used = Some(run.workers_used);
            Ok(())
        })
    }

    /// Marks a running job failed with its error message.
    pub fn fail(&self, id: &str, message: impl Into<String>) -> CoreResult<()> {
        let message = message.into();
        self.update(id, |job| {
            transition(job, JobStatus::Failed)?;
            job.output_path = None;
            job.error = Some(message);
            Ok(())
        })
    }

    /// Deletes the record. Jobs with a run in flight cannot be removed.
    pub fn remove(&self, id: &str) -> CoreResult<Job> {
        self.write(|jobs| {
            let job = jobs
                .get(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            if job.status.is_active() {
                return Err(CoreError::Conflict {
                    job_id: id.to_string(),
                    status: job.status,
                });
            }
            jobs.remove(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))
        })
    }

    /// Evicts finished jobs according to `policy` and returns them.
    pub fn prune(&self, policy: &RetentionPolicy, now: DateTime<Utc>) -> CoreResult<Vec<Job>> {
        if policy.is_keep_all() {
            return Ok(Vec::new());
        }
        self.write(|jobs| {
            let mut finished: Vec<(DateTime<Utc>, JobId)> = jobs
                .values()
                .filter(|job| job.status.is_terminal())
                .map(|job| (job.updated_at, job.id.clone()))
                .collect();
            // Newest first, so the cap keeps the most recent jobs.
            finished.sort_by(|a, b| b.cmp(a));

            let max_age = policy
                .max_age
                .and_then(|age| chrono::Duration::from_std(age).ok());

            let mut evict = Vec::new();
            let mut kept = 0usize;
            for (updated_at, id) in finished {
                let expired = max_age.is_some_and(|age| now - updated_at > age);
                let over_cap = policy
                    .max_finished_jobs
                    .is_some_and(|cap| kept >= cap);
                if expired || over_cap {
                    evict.push(id);
                } else {
                    kept += 1;
                }
            }

            Ok(evict
                .into_iter()
                .filter_map(|id| jobs.remove(&id))
                .collect())
        })
    }

    // ---- Internals ----

    /// Applies `f` to a copy of one job and commits the copy on success.
    fn update<T>(&self, id: &str, f: impl FnOnce(&mut Job) -> CoreResult<T>) -> CoreResult<T> {
        self.write(|jobs| {
            let current = jobs
                .get(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            let mut next = current.clone();
            let value = f(&mut next)?;
            next.updated_at = Utc::now();
            jobs.insert(id.to_string(), next);
            Ok(value)
        })
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut HashMap<JobId, Job>) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let _persist = self
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (value, snapshot) = {
            let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
            let value = f(&mut jobs)?;
            let snapshot = self
                .state_file
                .as_ref()
                .map(|_| jobs.values().cloned().collect::<Vec<Job>>());
            (value, snapshot)
        };

        if let (Some(path), Some(mut records)) = (self.state_file.as_deref(), snapshot) {
            records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            // The in-memory state stays authoritative if the disk write fails.
            if let Err(e) = write_state_file(path, &records) {
                warn!("Failed to persist job state to {}: {}", path.display(), e);
            }
        }

        Ok(value)
    }
}

fn transition(job: &mut Job, next: JobStatus) -> CoreResult<()> {
    if !job.status.can_advance_to(next) {
        return Err(CoreError::InvalidTransition {
            job_id: job.id.clone(),
            from: job.status,
            to: next,
        });
    }
    debug!("Job {}: {} -> {}", job.id, job.status, next);
    job.status = next;
    Ok(())
}

fn write_state_file(path: &Path, records: &[Job]) -> CoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, records)?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}
