//! Error types for segment listing and dumping.
//!
//! Every error is terminal for the operation in progress. None of them is
//! retried, and `UserCancelled` is not reported to the user at all.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Failed to allocate {requested} bytes")]
    AllocationFailure { requested: usize },

    #[error("No destination file was chosen")]
    UserCancelled,

    #[error("Failed to open {}: {source}", .path.display())]
    IoOpenFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    IoWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Segment not found: {0}")]
    SegmentNotFound(String),

    #[error("IDA error: {0}")]
    Ida(String),
}

impl DumpError {
    /// Cancellation is a silent abort, not a failure worth reporting.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DumpError::UserCancelled)
    }
}

impl From<idalib::IDAError> for DumpError {
    fn from(e: idalib::IDAError) -> Self {
        DumpError::Ida(e.to_string())
    }
}
