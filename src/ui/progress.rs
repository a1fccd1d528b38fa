use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Spinner on stderr counting checked links.
///
/// A disabled reporter is a no-op, so callers never need to branch on it.
/// indicatif hides the spinner on its own when stderr is not a terminal.
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { spinner: None };
        }

        let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} links checked {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));

        Self { spinner: Some(pb) }
    }

    pub fn is_enabled(&self) -> bool {
        self.spinner.is_some()
    }

    /// Count one checked link
    pub fn inc(&self) {
        if let Some(ref pb) = self.spinner {
            pb.inc(1);
        }
    }

    pub fn position(&self) -> u64 {
        self.spinner.as_ref().map_or(0, |pb| pb.position())
    }

    pub fn finish_and_clear(&self) {
        if let Some(ref pb) = self.spinner {
            pb.finish_and_clear();
        }
    }
}
