//! Error types for filesystem archive operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by [`crate::archive::FileArchiveStore`].
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An underlying filesystem call failed.
    #[error("Archive {operation} failed for {}", path.display())]
    IoFailed {
        /// The store operation
        operation: &'static str,
        /// The resolved path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file to read or delete does not exist.
    #[error("Archive file not found: {}", path.display())]
    NotFound {
        /// The resolved path
        path: PathBuf,
    },

    /// The request cannot be satisfied as given.
    #[error("Invalid archive argument: {reason}")]
    InvalidArgument {
        /// Why it was rejected
        reason: String,
    },

    /// The blocking call did not finish within its bound.
    #[error("Archive {operation} on {} timed out after {after:?}", path.display())]
    TimedOut {
        /// The store operation
        operation: &'static str,
        /// The resolved path
        path: PathBuf,
        /// The bound that elapsed
        after: Duration,
    },

    /// A recursive delete left some entries behind.
    #[error("Deleted {} of {attempted} entries under {}; {} failed", attempted - failed.len(), path.display(), failed.len())]
    DeleteIncomplete {
        /// Root of the delete
        path: PathBuf,
        /// Every entry that could not be removed
        failed: Vec<PathBuf>,
        /// Number of entries attempted
        attempted: usize,
        /// The first failure
        #[source]
        source: std::io::Error,
    },

    /// The blocking worker panicked or was cancelled.
    #[error("Archive worker for {operation} did not complete: {reason}")]
    WorkerFailed {
        /// The store operation
        operation: &'static str,
        /// Join failure description
        reason: String,
    },
}

impl ArchiveError {
    /// Check if this error indicates a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }

    /// Check if this error rejected caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ArchiveError::InvalidArgument { .. })
    }

    /// Check if this error is a filesystem failure (including timeouts and partial deletes).
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            ArchiveError::IoFailed { .. }
                | ArchiveError::TimedOut { .. }
                | ArchiveError::DeleteIncomplete { .. }
                | ArchiveError::WorkerFailed { .. }
        )
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ArchiveError::TimedOut { .. })
    }

    /// Paths a recursive delete failed to remove.
    pub fn failed_paths(&self) -> &[PathBuf] {
        match self {
            ArchiveError::DeleteIncomplete { failed, .. } => failed,
            _ => &[],
        }
    }
}

impl From<ArchiveError> for crate::Error {
    fn from(err: ArchiveError) -> Self {
        crate::Error::Archive(err)
    }
}
