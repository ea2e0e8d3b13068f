use clap::Parser;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

/// SmokeProbe - AI-generated smoke tests for any web page
#[derive(Parser, Debug)]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct CliArgs {
    /// Page under test
    #[arg(value_name = "URL")]
    pub url: String,

    /// Number of test cases to generate
    #[arg(value_name = "COUNT", default_value_t = 10)]
    pub count: usize,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Parent directory of the run artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Answer every generation call with the contents of FILE instead of calling the service
    #[arg(long, value_name = "FILE")]
    pub offline: Option<PathBuf>,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}
