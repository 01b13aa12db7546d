//! Library component for the vidrender CLI application.
//!
//! This contains the argument definitions and command logic that the binary
//! uses, split so integration tests and the binary share one implementation.

/// Command-line interface definitions using clap
pub mod cli;

/// Command implementations for each subcommand
pub mod commands;

/// Error handling utilities for the CLI
pub mod error;

/// Logging utilities and helper functions
pub mod logging;

/// Terminal rendering: spinner, summaries, errors
pub mod output;

// Re-exports for convenience
pub use cli::{Cli, Commands, FiltersArgs, ProbeArgs, ProcessArgs, parse_cli, parse_cli_from};
pub use commands::filters::run_filters;
pub use commands::probe::run_probe;
pub use commands::process::run_process;
