//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Enumerating regular files under a root using jwalk
//! - Streaming content digests with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal, the producer side of the pipeline
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Hasher, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."));
//! let hasher = Hasher::new();
//! for record in walker.walk() {
//!     let record = record.expect("walk failed");
//!     if let Ok(outcome) = hasher.digest(&record.path) {
//!         println!("{}  {}", outcome.digest, record.path.display());
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

pub use hasher::{DigestOutcome, Hasher, DIGEST_HEX_LEN};
pub use walker::Walker;

/// One regular file observed by the walker.
///
/// The digest is empty when the record is produced and is filled in exactly
/// once by the digest worker that receives it. After that the record moves
/// to the aggregator and is only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path to the file, unique within a scan
    pub path: PathBuf,
    /// Size in bytes as reported by directory metadata
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Lowercase hex content digest, `None` until computed
    pub digest: Option<String>,
}

impl FileRecord {
    /// Create a record with no digest yet.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            digest: None,
        }
    }

    /// Digest as a string slice, empty when not yet computed.
    #[must_use]
    pub fn digest_str(&self) -> &str {
        self.digest.as_deref().unwrap_or("")
    }
}

/// Errors that can occur during directory scanning.
///
/// Every variant is fatal for the run: the pipeline stops before the
/// resolution pass. Directories below the root that cannot be listed are
/// not errors; the walker logs and skips them.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The traversal itself reported an error.
    #[error("walk error for {path}: {message}")]
    Walk {
        /// Path where the error occurred
        path: PathBuf,
        /// Description from the walker
        message: String,
    },
}

impl ScanError {
    /// Classify an I/O error for `path` into the closest variant.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

/// Errors that can occur while digesting one file.
///
/// These are soft failures: the worker logs them and skips the record.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file could not be opened.
    #[error("open file {path} error: {source}")]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading failed partway through the file.
    #[error("read file {path} error: {source}")]
    Read {
        /// Path that failed mid-read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } => path,
        }
    }
}
