//! Main entry point for the vidrender CLI application.
//!
//! Parses arguments, sets up logging, and dispatches to the command handlers.
//! Errors are rendered once here and turned into a non-zero exit code.

use vidrender::error::CliResult;
use vidrender::logging::{level_for, log_file_path};
use vidrender::{Cli, Commands, output, parse_cli, run_filters, run_probe, run_process};
use vidrender_core::CoreError;
use vidrender_core::file_logging::setup::setup_logging;

use std::process;

fn main() {
    let cli_args = parse_cli();
    if let Err(e) = run(cli_args) {
        output::render_error("Error", &e.to_string());
        process::exit(1);
    }
}

fn run(cli_args: Cli) -> CliResult<()> {
    let log_level = level_for(cli_args.verbose);
    let command_name = match &cli_args.command {
        Commands::Process(_) => "process",
        Commands::Probe(_) => "probe",
        Commands::Filters(_) => "filters",
    };

    let log_file = match &cli_args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                CoreError::OperationFailed(format!(
                    "Failed to create log directory: {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            Some(log_file_path(dir, command_name))
        }
        None => None,
    };

    setup_logging(log_file.as_deref(), log_level).map_err(|e| {
        CoreError::OperationFailed(format!("Failed to set up logging: {}", e))
    })?;
    if let Some(path) = &log_file {
        log::debug!("Logging to {}", path.display());
    }

    match cli_args.command {
        Commands::Process(args) => run_process(args),
        Commands::Probe(args) => run_probe(&args),
        Commands::Filters(args) => run_filters(&args),
    }
}
