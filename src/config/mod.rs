//! Configuration management
//!
//! This module handles loading and managing configuration from
//! TOML files and CLI arguments.

use log::{debug, warn};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::constants::config_files;
use crate::core::constants::output::DEFAULT_TEMPLATE;
use crate::core::constants::pipeline::{MATCH_QUEUE_CAPACITY, PATH_QUEUE_CAPACITY};
use crate::core::error::{Result, UrlScanError};
use crate::discovery::extractor::IgnorePattern;
use crate::pipeline::WorkerSplit;
use crate::ui::output::OutputTemplate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Total worker budget shared by producers and consumers (0 = CPU count)
    pub workers: Option<usize>,

    /// Regex; URLs it fully matches are not checked
    pub ignore_pattern: Option<String>,

    /// Hide results equal to "200 OK"
    pub hide_ok: Option<bool>,

    /// Output line template
    pub format: Option<String>,

    /// Output destination: stdout, stderr or a file path
    pub output: Option<String>,

    /// Emit one JSON object per line instead of the template
    pub json: Option<bool>,

    /// File extensions to process when walking directories
    pub file_types: Option<Vec<String>>,

    /// Enable verbose logging
    pub verbose: Option<bool>,

    /// Exit with failure when any result is not a 2xx status
    pub fail_on_broken: Option<bool>,

    /// Paths the walk may queue ahead of the producers
    pub path_queue_capacity: Option<usize>,

    /// Unchecked matches the producers may queue ahead of the consumers
    pub match_queue_capacity: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: None, // Will default to CPU core count
            ignore_pattern: None,
            hide_ok: Some(false),
            format: Some(DEFAULT_TEMPLATE.to_string()),
            output: None, // stdout
            json: Some(false),
            file_types: None,
            verbose: Some(false),
            fail_on_broken: Some(false),
            path_queue_capacity: Some(PATH_QUEUE_CAPACITY),
            match_queue_capacity: Some(MATCH_QUEUE_CAPACITY),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            UrlScanError::Config(format!(
                "Could not read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            UrlScanError::Config(format!(
                "Invalid TOML in config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        // Validate the loaded configuration
        config.validate()?;
        Ok(config)
    }

    /// Try to find and load a config file in standard locations
    pub fn load_from_standard_locations() -> Self {
        Self::load_from_directory(Path::new("."))
    }

    /// Look for the config file in `dir` and up to three of its parents,
    /// falling back to defaults when none is found or it cannot be loaded.
    pub fn load_from_directory(dir: &Path) -> Self {
        for candidate in candidate_paths(dir) {
            if !candidate.is_file() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => {
                    debug!("Loaded config from {}", candidate.display());
                    return config;
                }
                Err(err) => warn!("Ignoring config file: {err}"),
            }
        }

        // Fall back to defaults
        Self::default()
    }

    /// Merge this config with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli_config: &CliConfig) {
        // Pipeline
        if let Some(workers) = cli_config.workers {
            self.workers = Some(workers);
        }
        if let Some(ref pattern) = cli_config.ignore_pattern {
            self.ignore_pattern = Some(pattern.clone());
        }
        if let Some(ref file_types) = cli_config.file_types {
            self.file_types = Some(file_types.clone());
        }

        // Output & format
        if cli_config.hide_ok {
            self.hide_ok = Some(true);
        }
        if let Some(ref format) = cli_config.format {
            self.format = Some(format.clone());
        }
        if let Some(ref output) = cli_config.output {
            self.output = Some(output.clone());
        }
        if cli_config.json {
            self.json = Some(true);
        }
        if cli_config.verbose {
            self.verbose = Some(true);
        }
        if cli_config.fail_on_broken {
            self.fail_on_broken = Some(true);
        }
    }

    /// Worker split for the configured budget
    pub fn worker_split(&self) -> WorkerSplit {
        WorkerSplit::from_budget(self.workers.unwrap_or(0))
    }

    /// Compile the ignore pattern; no pattern ignores nothing
    pub fn compile_ignore_pattern(&self) -> Result<IgnorePattern> {
        match self.ignore_pattern.as_deref() {
            Some(pattern) => IgnorePattern::new(pattern),
            None => Ok(IgnorePattern::none()),
        }
    }

    /// Parse the output template, falling back to the default one
    pub fn output_template(&self) -> Result<OutputTemplate> {
        OutputTemplate::parse(self.format.as_deref().unwrap_or(DEFAULT_TEMPLATE))
    }

    /// Convert file_types to a set for the path walker
    pub fn file_types_as_set(&self) -> Option<FxHashSet<String>> {
        self.file_types.as_ref().map(|types| {
            types
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect()
        })
    }

    pub fn path_queue_capacity(&self) -> usize {
        self.path_queue_capacity.unwrap_or(PATH_QUEUE_CAPACITY)
    }

    pub fn match_queue_capacity(&self) -> usize {
        self.match_queue_capacity.unwrap_or(MATCH_QUEUE_CAPACITY)
    }

    pub fn hide_ok(&self) -> bool {
        self.hide_ok.unwrap_or(false)
    }

    pub fn json(&self) -> bool {
        self.json.unwrap_or(false)
    }

    pub fn fail_on_broken(&self) -> bool {
        self.fail_on_broken.unwrap_or(false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers
            && workers > 1000
        {
            return Err(UrlScanError::Config(format!(
                "Worker count of {workers} is extremely high and may cause system instability. Consider using a smaller value."
            )));
        }

        if self.path_queue_capacity == Some(0) {
            return Err(UrlScanError::Config(
                "Path queue capacity cannot be 0. Expected a positive integer.".to_string(),
            ));
        }
        if self.match_queue_capacity == Some(0) {
            return Err(UrlScanError::Config(
                "Match queue capacity cannot be 0. Expected a positive integer.".to_string(),
            ));
        }

        // Fails fast before any worker is spawned
        self.compile_ignore_pattern()?;
        self.output_template()?;

        Ok(())
    }
}

fn candidate_paths(dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![dir.join(config_files::FILE_NAME)];
    let mut current = dir.to_path_buf();
    for _ in 0..config_files::MAX_PARENT_DEPTH {
        current = current.join("..");
        candidates.push(current.join(config_files::FILE_NAME));
    }
    candidates
}

/// Configuration options that can come from CLI
#[derive(Debug, Default)]
pub struct CliConfig {
    // Pipeline
    pub workers: Option<usize>,         // --workers
    pub ignore_pattern: Option<String>, // --ignore
    pub file_types: Option<Vec<String>>, // --include

    // Output & format
    pub hide_ok: bool,          // --hide-ok
    pub format: Option<String>, // --format
    pub output: Option<String>, // --output
    pub json: bool,             // --json
    pub quiet: bool,            // --quiet
    pub verbose: bool,          // --verbose
    pub no_progress: bool,      // --no-progress
    pub fail_on_broken: bool,   // --fail-on-broken

    // Configuration
    pub config_file: Option<String>, // --config
    pub no_config: bool,             // --no-config
}
