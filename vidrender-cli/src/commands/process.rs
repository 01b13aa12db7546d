//! Implementation of the 'process' subcommand.
//!
//! Drives one job through the core service the way a remote client would:
//! create the job, trigger processing, poll its status until it settles, then
//! fetch the output and report the benchmark.

use crate::cli::ProcessArgs;
use crate::commands::resolve_input_file;
use crate::error::{CliErrorContext, CliResult};
use crate::output;

use log::{debug, info};
use vidrender_core::filters::FilterKind;
use vidrender_core::{
    CoreConfig, CoreConfigBuilder, CoreError, Job, JobStatus, VideoRenderService, check_dependency,
};

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Builds the core configuration from the command arguments.
pub fn build_config(args: &ProcessArgs) -> CliResult<CoreConfig> {
    let mut builder = CoreConfigBuilder::new(&args.workspace)
        .segment_duration_secs(args.segment_duration)
        .keep_intermediates(args.keep_intermediates);

    if let Some(workers) = args.workers {
        builder = builder.worker_count(workers as usize);
    }
    if let Some(state_file) = &args.state_file {
        builder = builder.state_file(state_file);
    }
    if let Some(secs) = args.retain_max_age_secs {
        builder = builder.retention_max_age(Duration::from_secs(secs));
    }
    if let Some(max_jobs) = args.retain_max_jobs {
        builder = builder.retention_max_jobs(max_jobs);
    }
    builder.build()
}

pub fn run_process(args: ProcessArgs) -> CliResult<()> {
    // Cheap checks first, so argument mistakes surface without ffmpeg.
    let input = resolve_input_file(&args.input_path)?;
    let kind: FilterKind = args.filter.parse()?;
    let config = build_config(&args)?;

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    let service = VideoRenderService::new(config)?;
    let job_id = uuid::Uuid::new_v4().to_string();
    let size = fs::metadata(&input)
        .cli_context(format!("Failed to read {}", input.display()))?
        .len();

    service.create_job(&job_id, &input, size)?;
    info!("Created job {} for {}", job_id, input.display());

    let handle = service.start_processing(&job_id, kind.as_str())?;
    let job = if args.json {
        wait_quietly(&service, &job_id, &handle)?
    } else {
        wait_with_spinner(&service, &job_id, &handle, kind, &input)?
    };
    // The record already holds the outcome; the handle only carries it again.
    if let Err(e) = handle.join() {
        debug!("Run for job {} returned: {}", job_id, e);
    }
    let job = service.job_status(&job_id).unwrap_or(job);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    }

    match job.status {
        JobStatus::Completed => {
            let output_path = service.output_path(&job_id)?;
            info!("Job {} completed: {}", job_id, output_path.display());
            if !args.json {
                output::render_job_summary(&job);
            }
            Ok(())
        }
        status => {
            let message = job
                .error
                .unwrap_or_else(|| format!("job ended in status {status}"));
            Err(CoreError::OperationFailed(format!(
                "Job {job_id} failed: {message}"
            )))
        }
    }
}

fn wait_quietly(
    service: &VideoRenderService,
    job_id: &str,
    handle: &vidrender_core::RunHandle,
) -> CliResult<Job> {
    while !handle.is_finished() {
        thread::sleep(POLL_INTERVAL);
    }
    service.job_status(job_id)
}

fn wait_with_spinner(
    service: &VideoRenderService,
    job_id: &str,
    handle: &vidrender_core::RunHandle,
    kind: FilterKind,
    input: &Path,
) -> CliResult<Job> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let spinner = output::start_spinner(&format!("{kind} on {name}: starting"));

    let mut last = None;
    while !handle.is_finished() {
        let job = service.job_status(job_id)?;
        if last != Some(job.status) {
            spinner.set_message(stage_message(kind, &name, &job));
            last = Some(job.status);
        }
        thread::sleep(POLL_INTERVAL);
    }
    spinner.finish_and_clear();
    service.job_status(job_id)
}

fn stage_message(kind: FilterKind, name: &str, job: &Job) -> String {
    let stage = match job.status {
        JobStatus::Uploaded => "queued".to_string(),
        JobStatus::Segmenting => "segmenting".to_string(),
        JobStatus::RunningSequential => {
            format!("sequential pass over {} segment(s)", job.segment_count())
        }
        JobStatus::RunningParallel => {
            format!("parallel pass over {} segment(s)", job.segment_count())
        }
        JobStatus::Merging => "merging".to_string(),
        JobStatus::Completed => "done".to_string(),
        JobStatus::Failed => "failed".to_string(),
    };
    format!("{kind} on {name}: {stage}")
}
