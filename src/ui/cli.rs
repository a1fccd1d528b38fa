// Command-line interface definitions and parsing for urlscan

use crate::config::CliConfig;
use crate::discovery::path_utils::parse_file_types;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to scan (reads stdin when empty)
    pub files: Vec<String>,

    // Core Options
    /// Total workers split between extraction and checking (default: CPU cores)
    #[arg(
        short = 'w',
        long,
        value_name = "COUNT",
        help_heading = "Core Options"
    )]
    pub workers: Option<usize>,

    /// Skip URLs fully matching this regex
    #[arg(
        short = 'i',
        long,
        value_name = "REGEX",
        help_heading = "Core Options"
    )]
    pub ignore: Option<String>,

    /// File extensions to process when walking directories (e.g., md,html,txt)
    #[arg(long, value_name = "EXTENSIONS", help_heading = "Core Options")]
    pub include: Option<String>,

    // Output & Verbosity
    /// Hide links that answered 200 OK
    #[arg(short = 'n', long, help_heading = "Output & Verbosity")]
    pub hide_ok: bool,

    /// Output line template; placeholders: {file} {line} {column} {url} {result}
    #[arg(
        short = 'f',
        long,
        value_name = "TEMPLATE",
        help_heading = "Output & Verbosity"
    )]
    pub format: Option<String>,

    /// Write results to stdout, stderr or a file
    #[arg(
        short = 'o',
        long,
        value_name = "DEST",
        help_heading = "Output & Verbosity"
    )]
    pub output: Option<String>,

    /// Emit one JSON object per result
    #[arg(long, help_heading = "Output & Verbosity")]
    pub json: bool,

    /// Suppress progress and log output
    #[arg(short = 'q', long, help_heading = "Output & Verbosity")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, help_heading = "Output & Verbosity")]
    pub verbose: bool,

    /// Disable the progress spinner
    #[arg(long, help_heading = "Output & Verbosity")]
    pub no_progress: bool,

    /// Exit with status 1 if any link is not 2xx
    #[arg(long, help_heading = "Output & Verbosity")]
    pub fail_on_broken: bool,

    // Configuration
    /// Use specific config file
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Ignore config files
    #[arg(long, help_heading = "Configuration")]
    pub no_config: bool,
}

/// Convert parsed arguments into the CLI layer of the configuration
pub fn cli_to_config(cli: &Cli) -> CliConfig {
    let mut cli_config = CliConfig::default();

    // Pipeline
    cli_config.workers = cli.workers;
    cli_config.ignore_pattern = cli.ignore.clone();
    if let Some(ref include_str) = cli.include {
        let mut file_types: Vec<String> = parse_file_types(include_str).into_iter().collect();
        file_types.sort();
        cli_config.file_types = Some(file_types);
    }

    // Output & format
    cli_config.hide_ok = cli.hide_ok;
    cli_config.format = cli.format.clone();
    cli_config.output = cli.output.clone();
    cli_config.json = cli.json;
    cli_config.quiet = cli.quiet;
    cli_config.verbose = cli.verbose;
    cli_config.no_progress = cli.no_progress;
    cli_config.fail_on_broken = cli.fail_on_broken;

    // Configuration
    cli_config.config_file = cli.config.clone();
    cli_config.no_config = cli.no_config;

    cli_config
}
