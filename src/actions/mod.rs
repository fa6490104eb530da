//! File actions module.
//!
//! Holds the resolution pass that runs after the digest pipeline has fully
//! drained. It keeps the oldest copy in every duplicate group and either
//! reports (simulation) or removes (apply) the rest.
//!
//! ```no_run
//! use dupsweep::actions::{delete_file, DeleteMethod};
//! use std::path::Path;
//!
//! let result = delete_file(Path::new("/path/to/duplicate.txt"), DeleteMethod::Trash);
//! ```

pub mod delete;

pub use delete::{
    delete_file, resolve, ActionMode, CandidateOutcome, CandidateStatus, DeleteError,
    DeleteMethod, ResolutionReport,
};
