//! Duplicate group ordering.
//!
//! A [`DuplicateGroup`] is a digest bucket with more than one file, sorted
//! newest first. The last file, the oldest by modification time, is the one
//! kept; every file before it is a deletion candidate.
//!
//! The sort is stable, so files with equal modification times keep the
//! order in which they reached the aggregator. That order depends on which
//! worker finished first and is not reproducible across runs.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::DuplicateGroup;
//! use dupsweep::scanner::FileRecord;
//! use std::path::PathBuf;
//! use std::time::{Duration, SystemTime};
//!
//! let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
//! let old = FileRecord::new(PathBuf::from("/a.txt"), 1, t);
//! let new = FileRecord::new(PathBuf::from("/b.txt"), 1, t + Duration::from_secs(60));
//!
//! let group = DuplicateGroup::from_bucket("d".to_string(), vec![old, new]).unwrap();
//! assert_eq!(group.survivor().path, PathBuf::from("/a.txt"));
//! assert_eq!(group.candidates()[0].path, PathBuf::from("/b.txt"));
//! ```

use crate::scanner::FileRecord;

/// Confirmed duplicate group.
///
/// Built only through [`DuplicateGroup::from_bucket`], so there is always a
/// survivor and at least one candidate.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    digest: String,
    /// Every file but the oldest, newest first
    candidates: Vec<FileRecord>,
    survivor: FileRecord,
}

impl DuplicateGroup {
    /// Build a group from a digest bucket.
    ///
    /// Returns `None` when the bucket holds fewer than two files.
    #[must_use]
    pub fn from_bucket(digest: String, mut files: Vec<FileRecord>) -> Option<Self> {
        if files.len() <= 1 {
            return None;
        }
        sort_newest_first(&mut files);
        let survivor = files.pop()?;
        Some(Self {
            digest,
            candidates: files,
            survivor,
        })
    }

    /// Shared content digest.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Number of files in this group, survivor included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len() + 1
    }

    /// Always false; a group holds at least two files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The oldest file, which is kept.
    #[must_use]
    pub fn survivor(&self) -> &FileRecord {
        &self.survivor
    }

    /// Every file except the oldest, newest first.
    #[must_use]
    pub fn candidates(&self) -> &[FileRecord] {
        &self.candidates
    }
}

/// Stable sort by modification time, most recent first.
pub fn sort_newest_first(files: &mut [FileRecord]) {
    files.sort_by(|a, b| b.modified.cmp(&a.modified));
}
