use clap::Parser;
use tokio::sync::mpsc;
use urlscan::config::{CliConfig, Config};
use urlscan::core::constants::input::STDIN_SOURCE;
use urlscan::core::constants::pipeline::OUTPUT_QUEUE_CAPACITY;
use urlscan::discovery::{PathWalker, validate_paths};
use urlscan::pipeline::{Coordinator, PipelineSummary};
use urlscan::reporting::logging;
use urlscan::ui::{Cli, Destination, ProgressReporter, ResultWriter, cli_to_config};
use urlscan::validation::LivenessChecker;
use urlscan::{Match, UrlScanError};

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run_urlscan_logic(&cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Main scan logic extracted from main() for testing
pub async fn run_urlscan_logic(cli: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let cli_config = cli_to_config(cli);

    // Load and merge configuration
    let config = load_and_merge_config(&cli_config)?;

    let verbose = config.verbose.unwrap_or(false);
    logging::init_logger(verbose, cli_config.quiet);

    // Everything that can fail at startup fails before any worker runs
    let split = config.worker_split();
    let ignore = config.compile_ignore_pattern()?;
    let template = config.output_template()?;
    if !cli.files.is_empty() {
        validate_paths(&cli.files).inspect_err(|e| {
            logging::log_error("Could not find input", Some(e));
        })?;
        logging::log_file_info(&cli.files);
    }
    let destination = Destination::parse(config.output.as_deref());
    let out = destination.open()?;
    let checker = Arc::new(LivenessChecker::new()?);

    logging::log_config_info(&config, split);

    let coordinator = Coordinator::new(split, checker, ignore).with_queue_capacities(
        config.path_queue_capacity(),
        config.match_queue_capacity(),
    );

    let (tx, mut rx) = mpsc::channel::<Match>(OUTPUT_QUEUE_CAPACITY);
    let pipeline = if cli.files.is_empty() {
        let text = read_stdin().await?;
        tokio::spawn(async move { coordinator.run_text(STDIN_SOURCE, text, tx).await })
    } else {
        let walker = PathWalker::new(cli.files.iter().map(PathBuf::from).collect())
            .with_file_types(config.file_types_as_set());
        tokio::spawn(async move { coordinator.run_paths(walker, tx).await })
    };

    let progress = ProgressReporter::new(show_progress(&cli_config, &config, &destination));
    let mut writer = ResultWriter::new(out, template)
        .with_json(config.json())
        .with_hide_ok(config.hide_ok());

    // Single sink: results are written in arrival order
    while let Some(checked) = rx.recv().await {
        progress.inc();
        writer.write(&checked)?;
    }

    let summary: PipelineSummary = pipeline.await.map_err(UrlScanError::from)??;
    progress.finish_and_clear();
    let stats = writer.finish()?;

    if summary.classification_errors > 0 {
        logging::log_error(
            &format!("{} path(s) could not be read", summary.classification_errors),
            None,
        );
    }

    Ok(determine_exit_code(stats.broken, &config))
}

/// Load configuration from file or standard locations and merge with CLI config
pub fn load_and_merge_config(cli_config: &CliConfig) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if cli_config.no_config {
        Config::default()
    } else if let Some(ref config_file) = cli_config.config_file {
        Config::load_from_file(config_file).inspect_err(|e| {
            logging::log_error(
                &format!("Could not load config file '{config_file}'"),
                Some(e),
            );
        })?
    } else {
        Config::load_from_standard_locations()
    };

    // Merge CLI arguments with configuration (CLI takes precedence)
    config.merge_with_cli(cli_config);
    config.validate()?;
    Ok(config)
}

/// Read all of standard input; invalid UTF-8 is replaced
async fn read_stdin() -> Result<Vec<u8>, UrlScanError> {
    let raw = tokio::task::spawn_blocking(|| {
        let mut raw = Vec::new();
        std::io::stdin().read_to_end(&mut raw).map(|_| raw)
    })
    .await??;

    Ok(raw)
}

/// The spinner shares stderr, so it stays off when results are written there
pub fn show_progress(cli_config: &CliConfig, config: &Config, destination: &Destination) -> bool {
    !cli_config.quiet
        && !cli_config.no_progress
        && !config.json()
        && *destination != Destination::Stderr
}

/// Link outcomes only affect the exit code with --fail-on-broken
pub fn determine_exit_code(broken: usize, config: &Config) -> i32 {
    if config.fail_on_broken() && broken > 0 {
        1
    } else {
        0
    }
}
