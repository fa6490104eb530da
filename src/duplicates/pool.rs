//! Digest worker pool.
//!
//! A fixed number of named threads share one input receiver. Each worker
//! takes a record, digests the file, stamps the digest onto the record and
//! forwards it to the aggregator. Open and read failures are logged and the
//! record is dropped; a size mismatch is logged and the record still goes
//! through.
//!
//! ```text
//! walker ──► digest queue ──┬── digest-0 ──┐
//!                           ├── digest-1 ──┼──► aggregator queue ──► aggregator
//!                           └── digest-N ──┘
//! ```
//!
//! Each worker owns one clone of the aggregator sender and the pool keeps
//! none, so the aggregator queue closes exactly when the last worker exits.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, Hasher};

/// Counters shared by all workers.
#[derive(Debug, Default)]
struct PoolCounters {
    digested: AtomicU64,
    skipped: AtomicU64,
    size_mismatches: AtomicU64,
    abandoned: AtomicU64,
}

/// Totals reported once the pool has been joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Records digested and forwarded
    pub digested: u64,
    /// Records dropped after an open or read failure
    pub skipped: u64,
    /// Forwarded records whose bytes read differed from the declared size
    pub size_mismatches: u64,
    /// Records drained without digesting after shutdown was requested
    pub abandoned: u64,
    /// Workers that panicked instead of exiting normally
    pub panicked: usize,
}

/// Everything a worker needs, cloned once per thread.
#[derive(Clone)]
struct WorkerContext {
    hasher: Arc<Hasher>,
    input: Receiver<FileRecord>,
    output: Sender<FileRecord>,
    counters: Arc<PoolCounters>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl WorkerContext {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Log through the progress display so the spinner is not drawn over.
    fn warn(&self, mut emit: impl FnMut()) {
        match self.progress {
            Some(ref progress) => progress.suspend(&mut emit),
            None => emit(),
        }
    }
}

/// Builder for a [`DigestPool`].
pub struct DigestPoolBuilder {
    worker_count: usize,
    hasher: Arc<Hasher>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl DigestPoolBuilder {
    /// Start a builder for `worker_count` workers (at least one).
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            hasher: Arc::new(Hasher::new()),
            shutdown_flag: None,
            progress: None,
        }
    }

    #[must_use]
    pub fn hasher(mut self, hasher: Arc<Hasher>) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn shutdown_flag(mut self, flag: Option<Arc<AtomicBool>>) -> Self {
        self.shutdown_flag = flag;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: Option<Arc<dyn ProgressCallback>>) -> Self {
        self.progress = progress;
        self
    }

    /// Spawn every worker before returning.
    ///
    /// `output` is consumed: each worker receives its own clone and the
    /// original is dropped here.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a thread cannot be spawned. Workers already
    /// started exit on their own once `input` closes.
    pub fn spawn(
        self,
        input: Receiver<FileRecord>,
        output: Sender<FileRecord>,
    ) -> io::Result<DigestPool> {
        let counters = Arc::new(PoolCounters::default());
        let context = WorkerContext {
            hasher: self.hasher,
            input,
            output,
            counters: Arc::clone(&counters),
            shutdown_flag: self.shutdown_flag,
            progress: self.progress,
        };

        let mut handles = Vec::with_capacity(self.worker_count);
        for id in 0..self.worker_count {
            let ctx = context.clone();
            let handle = thread::Builder::new()
                .name(format!("digest-{id}"))
                .spawn(move || worker_loop(id, &ctx))?;
            handles.push(handle);
        }
        drop(context);

        log::debug!("Spawned {} digest workers", handles.len());
        Ok(DigestPool { handles, counters })
    }
}

/// Running pool of digest workers.
pub struct DigestPool {
    handles: Vec<JoinHandle<()>>,
    counters: Arc<PoolCounters>,
}

impl DigestPool {
    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit.
    ///
    /// Workers exit once the input queue is closed and drained, so callers
    /// must drop every input sender first. When this returns, the
    /// aggregator queue has no senders left.
    #[must_use]
    pub fn join(self) -> PoolStats {
        let mut panicked = 0;
        for handle in self.handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }

        PoolStats {
            digested: self.counters.digested.load(Ordering::SeqCst),
            skipped: self.counters.skipped.load(Ordering::SeqCst),
            size_mismatches: self.counters.size_mismatches.load(Ordering::SeqCst),
            abandoned: self.counters.abandoned.load(Ordering::SeqCst),
            panicked,
        }
    }
}

fn worker_loop(id: usize, ctx: &WorkerContext) {
    for mut record in ctx.input.iter() {
        if ctx.is_shutdown_requested() {
            ctx.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        log::debug!("digest {}", record.path.display());

        let outcome = match ctx.hasher.digest(&record.path) {
            Ok(outcome) => outcome,
            Err(e) => {
                ctx.warn(|| log::warn!("{}", e));
                ctx.counters.skipped.fetch_add(1, Ordering::Relaxed);
                if let Some(ref progress) = ctx.progress {
                    progress.on_file_skipped(&record.path);
                }
                continue;
            }
        };

        if outcome.size_mismatch(record.size) {
            ctx.warn(|| {
                log::warn!(
                    "{} read {} bytes, but file size is: {}",
                    record.path.display(),
                    outcome.bytes_read,
                    record.size
                );
            });
            ctx.counters.size_mismatches.fetch_add(1, Ordering::Relaxed);
        }

        record.digest = Some(outcome.digest);
        let completed = ctx.counters.digested.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref progress) = ctx.progress {
            progress.on_file_digested(completed, &record.path);
        }

        if ctx.output.send(record).is_err() {
            log::error!("digest worker {id}: aggregator queue closed early");
            break;
        }
    }
    log::trace!("digest worker {id} exiting");
}
