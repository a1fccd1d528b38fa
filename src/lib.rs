//! urlscan finds URLs in text files and checks that they are alive.
//!
//! Producers classify files and extract URLs while consumers issue one
//! HTTP GET per URL, connected by bounded queues.

pub mod config;
pub mod core;
pub mod discovery;
pub mod pipeline;
pub mod reporting;
pub mod ui;
pub mod validation;

// Re-export commonly used items
pub use crate::config::{CliConfig, Config};
pub use crate::core::{CheckOutcome, Classification, Input, Match, Result, UrlScanError};
pub use crate::discovery::{FileClassifier, IgnorePattern, PathWalker};
pub use crate::pipeline::{Coordinator, PipelineSummary, WorkerSplit};
pub use crate::validation::{CheckLink, LivenessChecker};
