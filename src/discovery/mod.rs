//! URL discovery and file processing
//!
//! This module decides which files are worth scanning, extracts URL
//! occurrences from their text and walks directories to feed the pipeline.

pub mod classifier;
pub mod extractor;
pub mod path_utils;
pub mod sniff;

// Re-export commonly used items
pub use classifier::{ClassifyPath, FileClassifier};
pub use extractor::{IgnorePattern, extract, extract_bytes};
pub use path_utils::{PathWalker, validate_paths};
