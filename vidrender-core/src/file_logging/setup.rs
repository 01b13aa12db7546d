use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;
use anyhow::Result;

/// Pattern shared by every log file.
pub const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Console output goes to stderr so stdout stays clean for `--json`.
const CONSOLE_PATTERN: &str = "[{l}] {m}{n}";

fn file_appender(log_file: &Path) -> Result<FileAppender> {
    // Create log directory if it doesn't exist
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(log_file)?)
}

/// Console logging, plus a file when `log_file` is given.
pub fn setup_logging(log_file: Option<&Path>, log_level: LevelFilter) -> Result<()> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = log_file {
        builder = builder.appender(Appender::builder().build("file", Box::new(file_appender(path)?)));
        root = root.appender("file");
    }

    log4rs::init_config(builder.build(root.build(log_level))?)?;

    Ok(())
}
