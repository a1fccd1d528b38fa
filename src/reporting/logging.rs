use crate::config::Config;
use crate::core::error::UrlScanError;
use crate::core::types::Match;
use crate::pipeline::{PipelineSummary, WorkerSplit};
use log::{debug, error, info, warn};
use std::path::Path;

/// Initialize the logger with appropriate level based on verbosity.
///
/// Warnings stay visible by default so unreadable files are reported.
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Off
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logger initialized with level: {level:?}");
}

/// Log configuration information
pub fn log_config_info(config: &Config, split: WorkerSplit) {
    let ignore = config.ignore_pattern.as_deref().unwrap_or("<none>");
    let output = config.output.as_deref().unwrap_or("stdout");

    info!(
        "Configuration: workers={} ({} producers, {} consumers)",
        split.total(),
        split.producers(),
        split.consumers()
    );
    info!(
        "Queues: paths={}, matches={}",
        config.path_queue_capacity(),
        config.match_queue_capacity()
    );
    info!(
        "Output: destination={output}, json={}, hide_ok={}",
        config.json(),
        config.hide_ok()
    );
    info!("Ignore pattern: {ignore}");
}

/// Log input sources
pub fn log_file_info<P: AsRef<Path>>(files: &[P]) {
    info!("Processing {} input path(s)", files.len());
    for (i, file) in files.iter().enumerate() {
        debug!("  {}. {}", i + 1, file.as_ref().display());
    }
}

/// Log the producer/consumer split of a run
pub fn log_worker_split(producers: usize, consumers: usize) {
    debug!("Starting {producers} producer(s) and {consumers} consumer(s)");
}

/// Report a path that could not be classified; the path is skipped
pub fn log_classification_error(err: &UrlScanError) {
    warn!("{err}");
}

/// Log pipeline completion
pub fn log_pipeline_complete(summary: &PipelineSummary) {
    info!(
        "Pipeline complete: {} path(s) queued, {} scanned, {} skipped, {} unreadable, {} link(s) checked",
        summary.paths_queued,
        summary.files_scanned,
        summary.files_skipped,
        summary.classification_errors,
        summary.matches_checked
    );
}

/// Log individual URL check results for debugging
pub fn log_check_result(checked: &Match) {
    match checked.result() {
        Some(outcome) if outcome.is_success() => debug!("✓ {} -> {outcome}", checked.url()),
        Some(outcome) => debug!("✗ {} -> {outcome}", checked.url()),
        None => debug!("? {} -> unchecked", checked.url()),
    }
}

/// Log error information
pub fn log_error(message: &str, source: Option<&dyn std::error::Error>) {
    match source {
        Some(err) => error!("{message}: {err}"),
        None => error!("{message}"),
    }
}
