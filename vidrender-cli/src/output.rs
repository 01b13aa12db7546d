// ============================================================================
// vidrender-cli/src/output.rs
// ============================================================================
//
// TERMINAL OUTPUT: Spinner, Summaries and Error Rendering
//
// Human-readable output goes to stdout in aligned "label  value" rows; the
// spinner draws on stderr so piping stdout stays clean.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use vidrender_core::filters::FilterKind;
use vidrender_core::{Job, VideoAnalytics, format_bytes, format_duration};

use std::time::Duration;

const LABEL_WIDTH: usize = 18;

/// Spinner shown while a job runs.
pub fn start_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
        pb.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<width$} {}", format!("{label}:"), value, width = LABEL_WIDTH);
}

fn section(title: &str) {
    println!("\n  {}", style(title).bold().cyan());
}

pub fn render_analytics(analytics: &VideoAnalytics) {
    section("Source");
    row("Duration", format_duration(analytics.duration));
    row(
        "Resolution",
        format!("{}x{} ({})", analytics.width, analytics.height, analytics.aspect_ratio),
    );
    row("Frame rate", format!("{:.2} fps", analytics.fps));
    row("Frames", analytics.total_frames);
    row("Size", format!("{:.2} MB", analytics.file_size_mb));
    row("Bitrate", format!("{:.2} Mbps", analytics.bitrate_mbps));
    row("Codec", analytics.video_codec.as_deref().unwrap_or("unknown"));
    row("Audio", if analytics.has_audio { "yes" } else { "no" });
}

/// Benchmark and output of a completed job.
pub fn render_job_summary(job: &Job) {
    if let Some(analytics) = &job.analytics {
        render_analytics(analytics);
    }

    section("Run");
    row("Job", &job.id);
    if let Some(kind) = job.filter_kind {
        row("Filter", kind);
    }
    row("Segments", job.segment_count());
    if let Some(workers) = job.workers_used {
        row("Workers", workers);
    }
    if let Some(seq) = job.sequential_time {
        row("Sequential", format!("{seq:.2}s"));
    }
    if let Some(par) = job.parallel_time {
        row("Parallel", format!("{par:.2}s"));
    }
    if let Some(speedup) = job.speedup {
        row("Speedup", style(format!("{speedup:.2}x")).bold().green());
    }

    if let Some(path) = &job.output_path {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!(
            "\n  {} Output ready at {} ({})",
            style("✓").green().bold(),
            path.display(),
            format_bytes(size)
        );
    }
}

pub fn render_filters() {
    section("Filters");
    for kind in FilterKind::ALL {
        row(kind.as_str(), kind.description());
    }
}

/// Error block on stderr.
pub fn render_error(title: &str, message: &str) {
    eprintln!(
        "\n  {} {}",
        style("✗").bold().red(),
        style(title).bold().red()
    );
    eprintln!("  {:<width$} {}", "Message:", message, width = LABEL_WIDTH);
}
