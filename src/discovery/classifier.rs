use log::trace;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::core::constants::classify::{
    BINARY_EXTENSIONS, COMMIT_MESSAGE_MARKER, LARGE_FILE_THRESHOLD, SCM_DIRECTORIES, SNIFF_LEN,
};
use crate::core::error::{Result, UrlScanError};
use crate::core::types::Classification;
use crate::discovery::sniff;

use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path};

static BINARY_EXTENSION_SET: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| BINARY_EXTENSIONS.iter().copied().collect());

pub trait ClassifyPath: Send + Sync {
    fn classify(&self, path: &Path) -> Result<Classification>;
}

/// Decides whether a path holds text worth scanning.
///
/// Cheap checks run first: the extension denylist and the SCM directory
/// denylist never touch the disk. Large files are sniffed from a short
/// prefix so binary blobs are rejected without reading them fully.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    large_file_threshold: u64,
    sniff_len: usize,
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self {
            large_file_threshold: LARGE_FILE_THRESHOLD,
            sniff_len: SNIFF_LEN,
        }
    }
}

impl ClassifyPath for FileClassifier {
    fn classify(&self, path: &Path) -> Result<Classification> {
        if is_binary_filename(path) {
            trace!("{}: binary extension", path.display());
            return Ok(Classification::NotText);
        }

        if is_scm_path(path) {
            trace!("{}: inside SCM directory", path.display());
            return Ok(Classification::NotText);
        }

        let metadata = fs::metadata(path)
            .map_err(|e| classification_error(path, "unable to stat", e))?;

        if metadata.is_dir() {
            return Ok(Classification::Directory);
        }

        let mut sniffed = false;
        if metadata.len() > self.large_file_threshold {
            let prefix = self.read_prefix(path)?;
            if !sniff::is_text(&prefix) {
                trace!("{}: large file with binary prefix", path.display());
                return Ok(Classification::NotText);
            }
            sniffed = true;
        }

        let raw = fs::read(path).map_err(|e| classification_error(path, "unable to read all", e))?;

        if !sniffed && !sniff::is_text(&raw) {
            return Ok(Classification::NotText);
        }

        Ok(Classification::Text(raw))
    }
}

impl FileClassifier {
    /// Classifier with a custom large-file threshold and sniff length.
    pub fn new(large_file_threshold: u64, sniff_len: usize) -> Self {
        Self {
            large_file_threshold,
            sniff_len,
        }
    }

    fn read_prefix(&self, path: &Path) -> Result<Vec<u8>> {
        let mut file = File::open(path)
            .map_err(|e| classification_error(path, "unable to open large file", e))?;

        let mut prefix = vec![0; self.sniff_len];
        file.read_exact(&mut prefix).map_err(|e| {
            classification_error(
                path,
                &format!("unable to read {} bytes from", self.sniff_len),
                e,
            )
        })?;

        Ok(prefix)
    }
}

/// True if the extension is on the binary denylist (case-insensitive).
pub fn is_binary_filename(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| BINARY_EXTENSION_SET.contains(ext.to_lowercase().as_str()))
}

/// True if any path segment is an SCM metadata directory. Commit message
/// files (`COMMIT_EDITMSG`, `TAG_EDITMSG`, ...) are exempt.
pub fn is_scm_path(path: &Path) -> bool {
    let is_commit_message = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains(COMMIT_MESSAGE_MARKER));
    if is_commit_message {
        return false;
    }

    path.components().any(|component| match component {
        Component::Normal(segment) => segment
            .to_str()
            .is_some_and(|segment| SCM_DIRECTORIES.contains(&segment)),
        _ => false,
    })
}

fn classification_error(path: &Path, action: &str, err: std::io::Error) -> UrlScanError {
    UrlScanError::Classification {
        path: path.display().to_string(),
        message: format!("{action}: {err}"),
    }
}
