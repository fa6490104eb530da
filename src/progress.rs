//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to display a spinner while the digest pipeline runs.
//! Walking and digesting overlap, so there is no known total up front; the
//! spinner shows a running count instead of a bar.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Phase name used by the digest pipeline.
pub const PHASE_DIGEST: &str = "digest";

/// Progress callback for the duplicate finding pipeline.
///
/// Workers call into this from many threads at once.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    fn on_phase_start(&self, phase: &str);

    /// Called after a worker finishes digesting a file.
    ///
    /// # Arguments
    ///
    /// * `completed` - Files digested so far across all workers
    /// * `path` - File that was just digested
    fn on_file_digested(&self, completed: u64, path: &Path);

    /// Called when a worker skips a file it could not read.
    fn on_file_skipped(&self, _path: &Path) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Run `emit` with any live display cleared, so log lines written to
    /// the terminal are not drawn over.
    fn suspend(&self, emit: &mut dyn FnMut()) {
        emit();
    }
}

/// Spinner-based progress reporter.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupsweep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.set_message(format!("Running {phase}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_file_digested(&self, completed: u64, path: &Path) {
        if self.quiet {
            return;
        }

        if let Ok(slot) = self.bar.lock() {
            if let Some(ref pb) = *slot {
                pb.set_position(completed);
                pb.set_message(truncate_path(&path.to_string_lossy(), 30));
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bar.lock().ok().and_then(|mut slot| slot.take()) {
            pb.finish_with_message(format!("{phase} complete"));
        }
    }

    fn suspend(&self, emit: &mut dyn FnMut()) {
        // clone out so other workers are not blocked while we print
        let bar = self.bar.lock().ok().and_then(|slot| slot.clone());
        match bar {
            Some(pb) => pb.suspend(emit),
            None => emit(),
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.len() >= max_len {
        let tail: String = file_name
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
