//! Error types for archive synchronization flows.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by [`crate::engine::ArchiveSyncEngine`] flows.
///
/// Lower-level cache and archive errors pass through unchanged unless a flow
/// has to report a compound outcome, which is what these variants are for.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SyncError {
    /// Seeding a new user's archive failed part-way.
    #[error("Failed to create archive for {username}")]
    ArchiveCreationFailed {
        /// The new user
        username: String,
        /// The write that failed
        #[source]
        source: Box<crate::Error>,
    },

    /// The counters file exists but cannot be used.
    #[error("Failed to load archive for {username}: {reason}")]
    ArchiveLoadFailed {
        /// The user logging in
        username: String,
        /// What was wrong with the file
        reason: String,
    },

    /// Account deletion left the archive or the cache partly intact.
    #[error("Failed to delete data for {username} ({} failures)", failures.len())]
    ArchiveDeletionFailed {
        /// The deleted user
        username: String,
        /// Every sub-operation that failed
        failures: Vec<crate::Error>,
    },

    /// A whole flow exceeded its time bound.
    #[error("{operation} for {username} timed out after {after:?}")]
    TimedOut {
        /// The flow
        operation: &'static str,
        /// The user
        username: String,
        /// The bound that elapsed
        after: Duration,
    },
}

impl SyncError {
    /// Check if this error came from archive creation.
    pub fn is_creation_failed(&self) -> bool {
        matches!(self, SyncError::ArchiveCreationFailed { .. })
    }

    /// Check if this error came from parsing or validating a counters file.
    pub fn is_load_failed(&self) -> bool {
        matches!(self, SyncError::ArchiveLoadFailed { .. })
    }

    /// Check if this error aggregates deletion failures.
    pub fn is_deletion_failed(&self) -> bool {
        matches!(self, SyncError::ArchiveDeletionFailed { .. })
    }

    /// Check if a flow timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::TimedOut { .. })
    }

    /// Sub-operation failures of an aggregated deletion.
    pub fn failures(&self) -> &[crate::Error] {
        match self {
            SyncError::ArchiveDeletionFailed { failures, .. } => failures,
            _ => &[],
        }
    }

    /// The user the failed flow was acting on.
    pub fn username(&self) -> &str {
        match self {
            SyncError::ArchiveCreationFailed { username, .. }
            | SyncError::ArchiveLoadFailed { username, .. }
            | SyncError::ArchiveDeletionFailed { username, .. }
            | SyncError::TimedOut { username, .. } => username,
        }
    }
}

impl From<SyncError> for crate::Error {
    fn from(err: SyncError) -> Self {
        crate::Error::Sync(err)
    }
}
