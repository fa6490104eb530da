//! Duplicate detection module.
//!
//! This module provides:
//! - The digest worker pool ([`pool`])
//! - The digest index and its single aggregator thread ([`index`])
//! - Pipeline orchestration with ordered drain barriers ([`finder`])
//! - Newest-first ordering of duplicate groups ([`groups`])

pub mod finder;
pub mod groups;
pub mod index;
pub mod pool;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary, DEFAULT_WORKER_COUNT};
pub use groups::{sort_newest_first, DuplicateGroup};
pub use index::{spawn_aggregator, DuplicateIndex};
pub use pool::{DigestPool, DigestPoolBuilder, PoolStats};
