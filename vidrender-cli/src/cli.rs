// vidrender-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "vidrender: Segmented video filter pipeline",
    long_about = "Splits a video into segments, applies a pixel filter sequentially and in \
                  parallel, merges the result and reports the parallel speedup."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Optional: Directory for a run log file (console only when unset)
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs a filter over a video and reports the benchmark
    Process(ProcessArgs),
    /// Prints analytics for a video without processing it
    Probe(ProbeArgs),
    /// Lists the available filters
    Filters(FiltersArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ProcessArgs {
    /// Video file to process
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Filter to apply (see `vidrender filters`)
    #[arg(short, long, value_name = "FILTER")]
    pub filter: String,

    /// Directory holding per-job segments and outputs
    #[arg(
        short,
        long,
        value_name = "DIR",
        env = "VIDRENDER_WORKSPACE",
        default_value = "vidrender_workspace"
    )]
    pub workspace: PathBuf,

    /// Segment length in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = vidrender_core::config::DEFAULT_SEGMENT_DURATION_SECS)]
    pub segment_duration: f64,

    /// Parallel workers (defaults to the number of CPU cores)
    #[arg(long, value_name = "N", env = "VIDRENDER_WORKERS", value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Keep raw and processed segments after the run
    #[arg(long, default_value_t = false)]
    pub keep_intermediates: bool,

    /// Optional: JSON file the job records are persisted to
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Evict finished jobs older than this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub retain_max_age_secs: Option<u64>,

    /// Keep at most this many finished jobs
    #[arg(long, value_name = "COUNT")]
    pub retain_max_jobs: Option<usize>,

    /// Print the final job record as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ProbeArgs {
    /// Video file to inspect
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Print analytics as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FiltersArgs {
    /// Print filter names as a JSON array
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Parses the command line of the current process.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses from an explicit argument list.
pub fn parse_cli_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}
