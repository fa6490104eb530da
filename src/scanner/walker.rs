//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] is the producer side of the digest pipeline. It enumerates
//! every regular file below a root exactly once and turns each into a
//! [`FileRecord`] with path, size and modification time filled in.
//!
//! Directories, symbolic links and other non-regular entries are skipped
//! silently. Symbolic links are never followed.
//!
//! An unreadable root is a [`ScanError`], which the pipeline treats as
//! fatal. A directory below the root that cannot be listed is logged and
//! its subtree skipped; the rest of the tree is still walked.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"));
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("walk error: {}", e),
//!     }
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use jwalk::WalkDir;

use super::{FileRecord, ScanError};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Drawn-over display to pause while warnings print
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Pause `progress` while skipped-directory warnings are written.
    #[must_use]
    pub fn with_progress(mut self, progress: Option<Arc<dyn ProgressCallback>>) -> Self {
        self.progress = progress;
        self
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check that the root exists, is a directory, and can be listed.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`], [`ScanError::NotADirectory`] or the
    /// classified I/O error from reading the root's metadata or entries.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| ScanError::from_io(self.root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        // metadata succeeds on a mode 000 directory, listing does not
        std::fs::read_dir(&self.root).map_err(|e| ScanError::from_io(self.root.clone(), e))?;
        Ok(())
    }

    /// Walk the directory tree, yielding one record per regular file.
    ///
    /// Iteration stops early when shutdown is requested. Errors are yielded
    /// in place; callers decide whether to continue. A failure to list the
    /// root is yielded as an error, a failure to list any deeper directory
    /// is logged and that subtree is skipped.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(false)
            .sort(true);

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if let Some(ref e) = entry.read_children_error {
                        return self.unreadable_dir(entry.path(), entry.depth, e);
                    }
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    self.record_for(entry.path())
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(ScanError::Walk {
                        path,
                        message: e.to_string(),
                    }))
                }
            })
    }

    fn unreadable_dir(
        &self,
        path: PathBuf,
        depth: usize,
        error: &jwalk::Error,
    ) -> Option<Result<FileRecord, ScanError>> {
        if depth == 0 {
            return Some(Err(match error.io_error().map(io::Error::kind) {
                Some(io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
                _ => ScanError::Walk {
                    path,
                    message: error.to_string(),
                },
            }));
        }

        let mut emit = || log::warn!("skipping unreadable directory {}: {}", path.display(), error);
        match self.progress {
            Some(ref progress) => progress.suspend(&mut emit),
            None => emit(),
        }
        None
    }

    /// Build a record from the file's own metadata.
    fn record_for(&self, path: PathBuf) -> Option<Result<FileRecord, ScanError>> {
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("File vanished during walk: {}", path.display());
                return None;
            }
            Err(e) => return Some(Err(ScanError::from_io(path, e))),
        };

        if !metadata.is_file() {
            return None;
        }

        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(source) => return Some(Err(ScanError::Io { path, source })),
        };

        log::trace!("Discovered {}", path.display());
        Some(Ok(FileRecord::new(path, metadata.len(), modified)))
    }

    /// Push every discovered record into `sender`, then close it by drop.
    ///
    /// Returns the number of records submitted.
    ///
    /// # Errors
    ///
    /// Returns the first traversal error. The sender is dropped either way,
    /// so consumers always observe the channel closing.
    pub fn produce(&self, sender: Sender<FileRecord>) -> Result<usize, ScanError> {
        self.validate_root()?;

        let mut submitted = 0usize;
        for entry in self.walk() {
            let record = entry?;
            if sender.send(record).is_err() {
                // every receiver is gone, nothing left to feed
                log::warn!("Digest queue closed before walk finished");
                break;
            }
            submitted += 1;
        }
        Ok(submitted)
    }
}
