//! Digest index and the single aggregator thread that fills it.
//!
//! The index has no internal synchronisation. It is created inside the
//! aggregator thread, mutated only there, and handed back by value through
//! the thread's join handle once the aggregator's input has closed and
//! drained. Whoever holds the returned index is the only owner.

use std::collections::HashMap;
use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use super::groups::DuplicateGroup;
use crate::scanner::FileRecord;

/// Mapping from digest to the records that produced it, in arrival order.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    buckets: HashMap<String, Vec<FileRecord>>,
    records: usize,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a digested record to its bucket.
    pub fn insert(&mut self, record: FileRecord) {
        debug_assert!(record.digest.is_some(), "record reached index without digest");
        let key = record.digest_str().to_string();
        self.buckets.entry(key).or_default().push(record);
        self.records += 1;
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no record has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total records across all buckets.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Iterate over `(digest, records)` pairs in unspecified order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[FileRecord])> {
        self.buckets
            .iter()
            .map(|(digest, files)| (digest.as_str(), files.as_slice()))
    }

    /// Iterate over buckets holding more than one record.
    pub fn duplicate_buckets(&self) -> impl Iterator<Item = (&str, &[FileRecord])> {
        self.buckets().filter(|(_, files)| files.len() > 1)
    }

    /// Consume the index into duplicate groups, ordered by digest.
    ///
    /// Single-record buckets are dropped. Each group is sorted newest first.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .buckets
            .into_iter()
            .filter_map(|(digest, files)| DuplicateGroup::from_bucket(digest, files))
            .collect();
        groups.sort_by(|a, b| a.digest().cmp(b.digest()));
        groups
    }
}

impl FromIterator<FileRecord> for DuplicateIndex {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Spawn the aggregator thread.
///
/// The thread drains `input` until every sender is dropped and then returns
/// the finished index through its join handle.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_aggregator(input: Receiver<FileRecord>) -> io::Result<JoinHandle<DuplicateIndex>> {
    thread::Builder::new()
        .name("aggregator".to_string())
        .spawn(move || {
            let mut index = DuplicateIndex::new();
            for record in input.iter() {
                log::trace!("aggregate {} -> {}", record.path.display(), record.digest_str());
                index.insert(record);
            }
            log::trace!("aggregator drained {} records", index.record_count());
            index
        })
}
