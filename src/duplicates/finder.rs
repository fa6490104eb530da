//! Duplicate finder: walker, digest pool and aggregator wired together.
//!
//! # Pipeline
//!
//! 1. Spawn the aggregator thread.
//! 2. Spawn all digest workers.
//! 3. Run the producer on the calling thread, feeding the digest queue.
//!    Returning from the producer drops its sender, closing the queue.
//! 4. Join every worker. Each held the only clones of the aggregator
//!    sender, so the aggregator queue closes here and not before.
//! 5. Join the aggregator and take ownership of its index.
//!
//! Steps 4 and 5 are the two drain barriers. A producer error is held until
//! both have passed so that no thread outlives the call.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};

use super::index::{spawn_aggregator, DuplicateIndex};
use super::pool::{DigestPoolBuilder, PoolStats};
use crate::progress::{ProgressCallback, PHASE_DIGEST};
use crate::scanner::{FileRecord, Hasher, ScanError, Walker};

/// Default number of digest workers.
pub const DEFAULT_WORKER_COUNT: usize = 128;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of digest worker threads
    pub worker_count: usize,
    /// Shutdown flag observed by the walker and every worker
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress sink
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("worker_count", &self.worker_count)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            shutdown_flag: None,
            progress: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of digest workers (clamped to at least one).
    #[must_use]
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }
}

/// Summary statistics from a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Regular files the producer submitted
    pub files_discovered: usize,
    /// Files digested and aggregated
    pub files_digested: u64,
    /// Files skipped after an open or read failure
    pub files_skipped: u64,
    /// Files whose bytes read differed from their declared size
    pub size_mismatches: u64,
    /// Distinct digests in the index
    pub digest_buckets: usize,
    /// Buckets with more than one file
    pub duplicate_groups: usize,
    /// Files that are not the oldest copy in their group
    pub duplicate_files: usize,
    /// Bytes held by those files
    pub reclaimable_space: u64,
    /// Wall time of the digest phase
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Reclaimable space in human-readable form.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }

    fn tally_index(&mut self, index: &DuplicateIndex) {
        self.digest_buckets = index.len();
        for (_, files) in index.duplicate_buckets() {
            self.duplicate_groups += 1;
            self.duplicate_files += files.len() - 1;
            // every copy has the same content, so any one size will do
            self.reclaimable_space += files[0].size * (files.len() as u64 - 1);
        }
    }

    fn tally_pool(&mut self, stats: &PoolStats) {
        self.files_digested = stats.digested;
        self.files_skipped = stats.skipped;
        self.size_mismatches = stats.size_mismatches;
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A pipeline thread could not be started.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        /// Which thread failed
        role: &'static str,
        /// The underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A pipeline thread panicked.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    /// Enumeration failed.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

/// Duplicate finder that runs the concurrent digest pipeline.
///
/// # Example
///
/// ```no_run
/// use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_worker_count(8));
/// let (index, summary) = finder.find_duplicates(Path::new(".")).unwrap();
///
/// println!("Found {} duplicate groups", summary.duplicate_groups);
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// # drop(index);
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            hasher: Arc::new(Hasher::new()),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest every regular file under `path` and index it by content.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory
    /// - Traversal fails anywhere below the root
    /// - A pipeline thread cannot be spawned or panics
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(DuplicateIndex, ScanSummary), FinderError> {
        let mut walker = Walker::new(path).with_progress(self.config.progress.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        walker.validate_root().map_err(|e| match e {
            ScanError::NotFound(p) => FinderError::PathNotFound(p),
            ScanError::NotADirectory(p) => FinderError::NotADirectory(p),
            other => FinderError::ScanError(other),
        })?;

        log::info!("Scanning {}", walker.root().display());
        self.run_pipeline(|sender| walker.produce(sender))
    }

    /// Run the pipeline over records that were enumerated elsewhere.
    ///
    /// # Errors
    ///
    /// Same as [`find_duplicates`](Self::find_duplicates) minus the
    /// path and traversal errors.
    pub fn find_duplicates_from_records(
        &self,
        records: Vec<FileRecord>,
    ) -> Result<(DuplicateIndex, ScanSummary), FinderError> {
        self.run_pipeline(|sender| {
            let mut submitted = 0;
            for record in records {
                if sender.send(record).is_err() {
                    break;
                }
                submitted += 1;
            }
            Ok(submitted)
        })
    }

    fn run_pipeline<F>(&self, produce: F) -> Result<(DuplicateIndex, ScanSummary), FinderError>
    where
        F: FnOnce(Sender<FileRecord>) -> Result<usize, ScanError>,
    {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let (digest_tx, digest_rx) = unbounded::<FileRecord>();
        let (compare_tx, compare_rx) = unbounded::<FileRecord>();

        let aggregator = spawn_aggregator(compare_rx).map_err(|source| FinderError::Spawn {
            role: "aggregator",
            source,
        })?;

        let pool = DigestPoolBuilder::new(self.config.worker_count)
            .hasher(Arc::clone(&self.hasher))
            .shutdown_flag(self.config.shutdown_flag.clone())
            .progress(self.config.progress.clone())
            .spawn(digest_rx, compare_tx)
            .map_err(|source| FinderError::Spawn {
                role: "digest worker",
                source,
            })?;

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_start(PHASE_DIGEST);
        }

        // the sender moves into the producer and is dropped when it returns
        let produced = produce(digest_tx);

        let pool_stats = pool.join();
        log::debug!("digest done");

        let index = aggregator
            .join()
            .map_err(|_| FinderError::ThreadPanicked("aggregator"))?;
        log::debug!("compare done");

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_end(PHASE_DIGEST);
        }

        summary.files_discovered = produced?;
        if pool_stats.panicked > 0 {
            return Err(FinderError::ThreadPanicked("digest worker"));
        }
        if self.is_shutdown_requested() {
            log::info!("Scan interrupted, discarding partial results");
            return Err(FinderError::Interrupted);
        }

        summary.tally_pool(&pool_stats);
        summary.tally_index(&index);
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Digested {} of {} files in {:.2?}: {} duplicate groups, {} reclaimable",
            summary.files_digested,
            summary.files_discovered,
            summary.scan_duration,
            summary.duplicate_groups,
            summary.reclaimable_display()
        );

        Ok((index, summary))
    }
}
