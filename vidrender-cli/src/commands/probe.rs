//! Implementation of the 'probe' subcommand.
//!
//! Reads the same analytics a job records at creation, without creating one.

use crate::cli::ProbeArgs;
use crate::commands::resolve_input_file;
use crate::error::CliResult;
use crate::output;

use log::debug;
use vidrender_core::check_dependency;
use vidrender_core::external::CrateFfprobeExecutor;
use vidrender_core::processing::probe_analytics;

pub fn run_probe(args: &ProbeArgs) -> CliResult<()> {
    let input = resolve_input_file(&args.input_path)?;
    check_dependency("ffprobe")?;

    debug!("Probing {}", input.display());
    let analytics = probe_analytics(&CrateFfprobeExecutor::new(), &input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analytics)?);
    } else {
        output::render_analytics(&analytics);
    }
    Ok(())
}
