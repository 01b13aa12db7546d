// vidrender-core/tests/service_tests.rs

mod common;

use common::{FakeFilter, FakeProber, toolchain, upload};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use vidrender_core::filters::FilterKind;
use vidrender_core::job::JobLayout;
use vidrender_core::{
    CoreConfig, CoreConfigBuilder, CoreError, JobStatus, RetentionPolicy, VideoRenderService,
};

fn service_with(config: CoreConfig, duration: f64) -> VideoRenderService {
    let filter = Arc::new(FakeFilter::new((duration / 10.0).ceil() as usize));
    let tools = toolchain(FakeProber::with_duration(duration, true), duration, filter);
    VideoRenderService::with_toolchain(config, tools).unwrap()
}

#[test]
fn create_job_starts_uploaded_with_analytics() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 35.0);

    let job = service.create_job("new", &source, size)?;
    assert_eq!(job.status, JobStatus::Uploaded);
    assert_eq!(job.source_size_bytes, 4096);
    assert!(job.filter_kind.is_none());
    assert!(job.segments.is_empty());

    let analytics = job.analytics.unwrap();
    assert_eq!(analytics.duration, 35.0);
    assert_eq!(analytics.aspect_ratio, "16:9");
    assert_eq!(analytics.total_frames, 875);
    assert!(analytics.has_audio);
    Ok(())
}

#[test]
fn duplicate_job_id_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 20.0);

    service.create_job("twice", &source, size)?;
    let err = service.create_job("twice", &source, size).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateJob(ref id) if id == "twice"));
    assert_eq!(service.list_jobs().len(), 1);
    Ok(())
}

#[test]
fn job_ids_that_escape_the_workspace_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 20.0);

    service.create_job("keep", &source, size)?;
    service.start_processing("keep", "sepia")?.join()?;
    let kept_output = service.output_path("keep")?;

    let outside = uploads.path().join("precious");
    let outside_str = outside.to_string_lossy().into_owned();
    for bad in ["", ".", "..", "../precious", "keep/../keep", "a/b", outside_str.as_str()] {
        let err = service.create_job(bad, &source, size).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidJobId(ref id) if id == bad),
            "{bad:?} gave {err}"
        );
    }

    let ids: Vec<String> = service.list_jobs().into_iter().map(|j| j.id).collect();
    assert_eq!(ids, vec!["keep".to_string()]);
    assert!(kept_output.exists());
    assert!(source.exists());
    assert!(!outside.exists());
    Ok(())
}

#[test]
fn unknown_job_is_not_found_everywhere() {
    let workspace = tempdir().unwrap();
    let service = service_with(CoreConfig::new(workspace.path()), 20.0);

    assert!(matches!(service.job_status("ghost"), Err(CoreError::NotFound(_))));
    assert!(matches!(
        service.start_processing("ghost", "sepia"),
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(service.output_path("ghost"), Err(CoreError::NotFound(_))));
    assert!(matches!(service.remove_job("ghost"), Err(CoreError::NotFound(_))));
}

#[test]
fn invalid_filter_leaves_job_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 20.0);
    service.create_job("plain", &source, size)?;

    match service.start_processing("plain", "rainbow") {
        Err(CoreError::InvalidFilter { name, valid }) => {
            assert_eq!(name, "rainbow");
            for kind in FilterKind::ALL {
                assert!(valid.contains(kind.as_str()), "{valid}");
            }
        }
        other => panic!("expected InvalidFilter, got {:?}", other.map(|h| h.job_id().to_string())),
    }

    let job = service.job_status("plain")?;
    assert_eq!(job.status, JobStatus::Uploaded);
    assert!(job.filter_kind.is_none());
    Ok(())
}

#[test]
fn second_trigger_while_running_conflicts() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 40.0);
    service.create_job("busy", &source, size)?;

    let handle = service.start_processing("busy", "sepia")?;
    // The claim happens before the trigger returns.
    match service.start_processing("busy", "blur") {
        Err(CoreError::Conflict { job_id, status }) => {
            assert_eq!(job_id, "busy");
            assert!(status.is_active(), "{status}");
        }
        other => panic!("expected Conflict, got {:?}", other.map(|h| h.job_id().to_string())),
    }
    assert!(matches!(
        service.remove_job("busy"),
        Err(CoreError::Conflict { .. })
    ));

    let job = handle.join()?;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.filter_kind, Some(FilterKind::Sepia));

    // Completed jobs are not startable either.
    assert!(matches!(
        service.start_processing("busy", "sepia"),
        Err(CoreError::Conflict { status: JobStatus::Completed, .. })
    ));
    Ok(())
}

#[test]
fn output_is_not_ready_before_completion() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 20.0);
    service.create_job("early", &source, size)?;

    match service.output_path("early") {
        Err(CoreError::NotReady { status, .. }) => assert_eq!(status, JobStatus::Uploaded),
        other => panic!("expected NotReady, got {other:?}"),
    }

    service.start_processing("early", "cool_tone")?.join()?;
    let output = service.output_path("early")?;
    assert!(output.exists());
    assert_eq!(
        output,
        JobLayout::new(&service.config().workspace_dir, "early").output_file()
    );
    Ok(())
}

#[test]
fn status_is_monotonic_across_a_run() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 60.0);
    service.create_job("watched", &source, size)?;

    let handle = service.start_processing("watched", "warm_tone")?;
    let mut seen = vec![service.job_status("watched")?.status];
    while !handle.is_finished() {
        let status = service.job_status("watched")?.status;
        if seen.last() != Some(&status) {
            seen.push(status);
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    handle.join()?;
    let last = service.job_status("watched")?.status;
    if seen.last() != Some(&last) {
        seen.push(last);
    }

    // Polling may miss short stages, but never sees one go backwards.
    let order = [
        JobStatus::Segmenting,
        JobStatus::RunningSequential,
        JobStatus::RunningParallel,
        JobStatus::Merging,
        JobStatus::Completed,
    ];
    let ranks: Vec<usize> = seen
        .iter()
        .map(|s| order.iter().position(|o| o == s).unwrap())
        .collect();
    assert_eq!(seen.last(), Some(&JobStatus::Completed));
    assert!(ranks.windows(2).all(|w| w[0] < w[1]), "{seen:?}");
    Ok(())
}

#[test]
fn remove_job_deletes_record_and_workspace() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let service = service_with(CoreConfig::new(workspace.path()), 20.0);

    service.create_job("gone", &source, size)?;
    service.start_processing("gone", "grayscale")?.join()?;
    let root = JobLayout::new(&service.config().workspace_dir, "gone")
        .root()
        .to_path_buf();
    assert!(root.exists());

    service.remove_job("gone")?;
    assert!(!root.exists());
    assert!(matches!(service.job_status("gone"), Err(CoreError::NotFound(_))));
    // The upload itself belongs to the caller.
    assert!(source.exists());
    Ok(())
}

#[test]
fn retention_cap_evicts_oldest_finished_jobs() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let config = CoreConfigBuilder::new(workspace.path())
        .worker_count(2)
        .retention_max_jobs(1)
        .build()?;
    let service = service_with(config, 20.0);

    service.create_job("first", &source, size)?;
    service.start_processing("first", "sepia")?.join()?;
    service.create_job("second", &source, size)?;
    // Still uploaded, so never a candidate for eviction.
    service.create_job("waiting", &source, size)?;
    service.start_processing("second", "sepia")?.join()?;

    let ids: Vec<String> = service.list_jobs().into_iter().map(|j| j.id).collect();
    assert_eq!(ids, vec!["second".to_string(), "waiting".to_string()]);
    assert!(
        !JobLayout::new(&service.config().workspace_dir, "first")
            .root()
            .exists()
    );
    Ok(())
}

#[test]
fn default_retention_keeps_everything() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let (source, size) = upload(uploads.path(), "clip.mp4");
    let config = CoreConfigBuilder::new(workspace.path())
        .retention(RetentionPolicy::keep_all())
        .build()?;
    let service = service_with(config, 10.0);

    for id in ["a", "b", "c"] {
        service.create_job(id, &source, size)?;
        service.start_processing(id, "contrast")?.join()?;
    }
    assert!(service.prune_expired()?.is_empty());
    assert_eq!(service.list_jobs().len(), 3);
    Ok(())
}

#[test]
fn state_file_survives_a_restart() -> Result<(), Box<dyn std::error::Error>> {
    let uploads = tempdir()?;
    let workspace = tempdir()?;
    let state = workspace.path().join("jobs.json");
    let (source, size) = upload(uploads.path(), "clip.mp4");

    let config = CoreConfigBuilder::new(workspace.path())
        .state_file(&state)
        .worker_count(2)
        .build()?;
    {
        let service = service_with(config.clone(), 20.0);
        service.create_job("durable", &source, size)?;
        service.create_job("pending", &source, size)?;
        service.start_processing("durable", "edge_detection")?.join()?;
    }
    assert!(state.exists());

    let service = service_with(config, 20.0);
    let durable = service.job_status("durable")?;
    assert_eq!(durable.status, JobStatus::Completed);
    assert_eq!(durable.filter_kind, Some(FilterKind::EdgeDetection));
    assert!(service.output_path("durable")?.exists());
    assert_eq!(service.job_status("pending")?.status, JobStatus::Uploaded);
    Ok(())
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let workspace = tempdir().unwrap();
    let err = CoreConfigBuilder::new(workspace.path())
        .segment_duration_secs(0.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}
