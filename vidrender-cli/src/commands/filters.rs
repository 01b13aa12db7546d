//! Implementation of the 'filters' subcommand.

use crate::cli::FiltersArgs;
use crate::error::CliResult;
use crate::output;

use vidrender_core::VideoRenderService;

pub fn run_filters(args: &FiltersArgs) -> CliResult<()> {
    if args.json {
        let names: Vec<&str> = VideoRenderService::available_filters()
            .iter()
            .map(|k| k.as_str())
            .collect();
        println!("{}", serde_json::to_string(&names)?);
    } else {
        output::render_filters();
    }
    Ok(())
}
