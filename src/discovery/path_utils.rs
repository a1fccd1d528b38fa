use log::warn;
use rustc_hash::FxHashSet;

use std::path::{Path, PathBuf};

use crate::core::error::{Result, UrlScanError};
use crate::core::types::Input;

/// Lazily walks the given roots and yields every file as an [`Input`].
///
/// The walk only starts when the walker is iterated, so it can be moved
/// into the pipeline's feeder and race ahead of the producers only as far
/// as the bounded path queue allows. Hidden entries are included so that
/// SCM directories reach the classifier, which decides what to skip.
#[derive(Debug, Clone, Default)]
pub struct PathWalker {
    roots: Vec<PathBuf>,
    file_types: Option<FxHashSet<String>>,
}

impl PathWalker {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            file_types: None,
        }
    }

    /// Only yield files with one of these extensions; `""` selects files
    /// without an extension.
    pub fn with_file_types(mut self, file_types: Option<FxHashSet<String>>) -> Self {
        self.file_types = file_types;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl IntoIterator for PathWalker {
    type Item = Input;
    type IntoIter = Box<dyn Iterator<Item = Input>>;

    fn into_iter(self) -> Self::IntoIter {
        let Some((first, rest)) = self.roots.split_first() else {
            return Box::new(std::iter::empty());
        };

        let mut builder = ignore::WalkBuilder::new(first);
        for root in rest {
            builder.add(root);
        }
        builder.hidden(false); // Include hidden files

        let file_types = self.file_types;
        let walk = builder.build().filter_map(move |entry| match entry {
            Ok(entry) => {
                let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                if is_file && matches_file_type(entry.path(), file_types.as_ref()) {
                    Some(Input::Path(entry.into_path()))
                } else {
                    None
                }
            }
            Err(err) => {
                warn!("Skipping unreadable entry: {err}");
                None
            }
        });

        Box::new(walk)
    }
}

/// Validate that all input paths exist before the pipeline starts.
pub fn validate_paths<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(UrlScanError::PathExpansion(format!(
                "File not found: '{}'",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Parse a comma separated extension list such as `md,html,txt`.
pub fn parse_file_types(raw: &str) -> FxHashSet<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_string())
        .collect()
}

fn matches_file_type(path: &Path, file_types: Option<&FxHashSet<String>>) -> bool {
    let Some(extensions) = file_types else {
        return true;
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.contains(ext),
        // Include files without extensions if "" is in the set
        None => extensions.contains(""),
    }
}
