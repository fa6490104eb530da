//! dupsweep - concurrent duplicate file sweeper
//!
//! Walks a directory tree, digests every regular file with BLAKE3 on a pool
//! of worker threads, groups files by digest on a single aggregator thread,
//! and then keeps the oldest copy in each group while deleting (or, in dry
//! run mode, reporting) the rest.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Context;

use crate::actions::resolve;
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};

/// Run the application with parsed arguments.
///
/// Logging must already be initialized by the caller.
///
/// # Errors
///
/// Returns an error when configuration is invalid, the signal handler cannot
/// be installed, or the scan fails fatally or is interrupted. Per-file digest
/// failures and failed deletions are logged and do not produce an error.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml().context("failed to render configuration")?);
        return Ok(ExitCode::Success);
    }

    log::debug!("Effective configuration: {:?}", config);

    // read once: the whole resolution pass runs in this mode
    let mode = config.action_mode();

    let handler = signal::install_handler().context("failed to install Ctrl+C handler")?;

    let mut finder_config = FinderConfig::default()
        .with_worker_count(config.worker_count)
        .with_shutdown_flag(handler.get_flag());
    if !cli.quiet && cli.verbose == 0 {
        let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(false));
        finder_config = finder_config.with_progress_callback(progress);
    }

    let (index, summary) = DuplicateFinder::new(finder_config)
        .find_duplicates(&config.root)
        .with_context(|| format!("scan of {} failed", config.root.display()))?;

    if summary.files_skipped > 0 {
        log::warn!("{} file(s) could not be read and were skipped", summary.files_skipped);
    }

    let report = resolve(index, mode);
    log::info!("{}", report.summary());

    Ok(ExitCode::Success)
}
