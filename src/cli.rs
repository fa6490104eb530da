//! Command-line interface definitions for dupsweep.
//!
//! Every option is optional at the clap level so that the config layer can
//! tell "not given" apart from "given with the default value". Defaults live
//! in [`crate::config::Config`].
//!
//! ```bash
//! # Report what would be removed under ~/Downloads (dry run is the default)
//! dupsweep -p ~/Downloads
//!
//! # Actually remove newer copies, with 16 digest workers
//! dupsweep -p ~/Downloads --dry false --count 16
//!
//! # Per-file progress logging
//! dupsweep -v -p ~/Downloads
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use serde::Serialize;

/// Remove duplicate files, keeping the oldest copy of each.
///
/// Files are compared by BLAKE3 digest of their full content. Within each
/// group of identical files the one with the oldest modification time is
/// kept and the rest are deleted, or only reported in dry-run mode.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates [default: .]
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Dry run: only report files that would be removed [default: true]
    #[arg(long = "dry", value_name = "BOOL", action = ArgAction::Set)]
    pub dry_run: Option<bool>,

    /// Number of digest worker threads [default: 128]
    #[arg(short = 'c', long = "count", value_name = "N")]
    pub worker_count: Option<usize>,

    /// In apply mode, move files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Increase verbosity level (-v for per-file logging, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", env = "DUPSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

/// The subset of CLI flags that overrides configuration values.
///
/// Unset fields are skipped on serialization so they do not mask values
/// from lower configuration layers.
#[derive(Debug, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash: Option<bool>,
}

impl Cli {
    /// Extract the configuration overrides given on the command line.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            root: self.path.clone(),
            dry_run: self.dry_run,
            worker_count: self.worker_count,
            trash: self.trash.then_some(true),
        }
    }
}
