//! Resolution pass: decide and carry out deletions.
//!
//! # Overview
//!
//! [`resolve`] takes ownership of a finished [`DuplicateIndex`], turns every
//! bucket with more than one file into a [`DuplicateGroup`], and acts on all
//! files except the oldest:
//!
//! - [`ActionMode::Simulate`] only reports what would be deleted
//! - [`ActionMode::Apply`] deletes, permanently or to the system trash
//!
//! A failed deletion is logged and recorded; the pass always continues with
//! the remaining candidates and groups.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::{resolve, ActionMode};
//! use dupsweep::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (index, _summary) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! let report = resolve(index, ActionMode::Simulate);
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::{DuplicateGroup, DuplicateIndex};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// How files are removed in apply mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMethod {
    /// Unlink the file.
    #[default]
    Permanent,
    /// Move the file to the platform trash.
    Trash,
}

/// What the resolution pass does with deletion candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    /// Report only; the filesystem is never touched.
    Simulate,
    /// Delete candidates with the given method.
    Apply(DeleteMethod),
}

impl ActionMode {
    /// Build a mode from the dry-run flag and trash preference.
    #[must_use]
    pub fn from_flags(dry_run: bool, use_trash: bool) -> Self {
        if dry_run {
            Self::Simulate
        } else if use_trash {
            Self::Apply(DeleteMethod::Trash)
        } else {
            Self::Apply(DeleteMethod::Permanent)
        }
    }

    /// Whether this mode leaves the filesystem untouched.
    #[must_use]
    pub fn is_simulation(self) -> bool {
        matches!(self, Self::Simulate)
    }
}

/// Remove one file.
///
/// # Errors
///
/// Returns a [`DeleteError`] classified from the underlying failure.
pub fn delete_file(path: &Path, method: DeleteMethod) -> Result<(), DeleteError> {
    match method {
        DeleteMethod::Permanent => fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e)),
        DeleteMethod::Trash => {
            // trash reports a missing file as a generic error
            if fs::symlink_metadata(path).is_err() {
                return Err(DeleteError::NotFound(path.to_path_buf()));
            }
            trash::delete(path).map_err(|e| DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

/// Final state of one deletion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    /// Simulation mode; nothing was done.
    Simulated,
    /// The file was removed.
    Deleted,
    /// Removal failed with this message.
    Failed(String),
}

/// One deletion candidate and what happened to it.
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    /// Candidate file
    pub path: PathBuf,
    /// Digest shared with its group
    pub digest: String,
    /// Number of files in the group
    pub group_size: usize,
    /// Declared size of the file
    pub size: u64,
    /// Result of acting on it
    pub status: CandidateStatus,
}

/// Everything the resolution pass did.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// One entry per candidate, grouped by digest order
    pub outcomes: Vec<CandidateOutcome>,
    /// The oldest file of each group, which was kept
    pub kept: Vec<PathBuf>,
    /// Whether the pass ran in simulation mode
    pub simulation: bool,
}

impl ResolutionReport {
    /// Number of duplicate groups processed.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.kept.len()
    }

    /// Candidates actually removed.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.count(|s| matches!(s, CandidateStatus::Deleted))
    }

    /// Candidates whose removal failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.count(|s| matches!(s, CandidateStatus::Failed(_)))
    }

    /// Candidates reported in simulation mode.
    #[must_use]
    pub fn simulated_count(&self) -> usize {
        self.count(|s| matches!(s, CandidateStatus::Simulated))
    }

    /// Bytes freed by successful deletions.
    #[must_use]
    pub fn bytes_freed(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|o| o.status == CandidateStatus::Deleted)
            .map(|o| o.size)
            .sum()
    }

    fn count(&self, pred: impl Fn(&CandidateStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// Human-readable summary of the pass.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.simulation {
            let bytes: u64 = self.outcomes.iter().map(|o| o.size).sum();
            return format!(
                "Would delete {} file(s) in {} group(s), freeing {}",
                self.simulated_count(),
                self.group_count(),
                bytesize::ByteSize::b(bytes)
            );
        }

        if self.failure_count() == 0 {
            format!(
                "Deleted {} file(s) in {} group(s), freed {}",
                self.deleted_count(),
                self.group_count(),
                bytesize::ByteSize::b(self.bytes_freed())
            )
        } else {
            format!(
                "Deleted {} file(s) in {} group(s), {} failed, freed {}",
                self.deleted_count(),
                self.group_count(),
                self.failure_count(),
                bytesize::ByteSize::b(self.bytes_freed())
            )
        }
    }
}

/// Run the resolution pass over a fully drained index.
///
/// `mode` is fixed for the whole pass. Groups are visited in digest order;
/// within a group every file but the oldest is acted on.
#[must_use]
pub fn resolve(index: DuplicateIndex, mode: ActionMode) -> ResolutionReport {
    let mut report = ResolutionReport {
        simulation: mode.is_simulation(),
        ..ResolutionReport::default()
    };

    if report.simulation {
        log::info!("dry run mode, not really deleting files");
    }

    for group in index.into_groups() {
        resolve_group(&group, mode, &mut report);
    }

    report
}

fn resolve_group(group: &DuplicateGroup, mode: ActionMode, report: &mut ResolutionReport) {
    let group_size = group.len();

    for file in group.candidates() {
        let status = match mode {
            ActionMode::Simulate => {
                log::info!(
                    "would delete digest: {}, file: {} dup: {}",
                    group.digest(),
                    file.path.display(),
                    group_size
                );
                CandidateStatus::Simulated
            }
            ActionMode::Apply(method) => match delete_file(&file.path, method) {
                Ok(()) => {
                    log::info!(
                        "delete digest: {}, file: {} dup: {}",
                        group.digest(),
                        file.path.display(),
                        group_size
                    );
                    CandidateStatus::Deleted
                }
                Err(e) => {
                    log::error!(
                        "delete error digest: {}, file: {} dup: {} err: {}",
                        group.digest(),
                        file.path.display(),
                        group_size,
                        e
                    );
                    CandidateStatus::Failed(e.to_string())
                }
            },
        };

        report.outcomes.push(CandidateOutcome {
            path: file.path.clone(),
            digest: group.digest().to_string(),
            group_size,
            size: file.size,
            status,
        });
    }

    log::debug!("keep {}", group.survivor().path.display());
    report.kept.push(group.survivor().path.clone());
}
