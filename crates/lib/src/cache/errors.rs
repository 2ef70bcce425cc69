//! Cache error types.
//!
//! Transport failures from a cache backend are carried as a [`CacheFault`],
//! a plain tagged value. [`crate::cache::policy::recover`] is the only place a
//! fault turns into a [`CacheError`] that callers see.

use std::fmt;

use thiserror::Error;

/// Class of a failed cache round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Backend unreachable, connection refused or dropped.
    ConnectionFailure,
    /// Round-trip exceeded its time bound.
    Timeout,
    /// Value could not be encoded or decoded.
    Serialization,
    /// Anything else.
    Other,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::ConnectionFailure => "connection failure",
            FaultKind::Timeout => "timeout",
            FaultKind::Serialization => "serialization error",
            FaultKind::Other => "unknown error",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified transport failure reported by a [`crate::cache::CacheBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFault {
    pub kind: FaultKind,
    pub message: String,
}

impl CacheFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ConnectionFailure, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Timeout, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Serialization, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Other, message)
    }
}

impl fmt::Display for CacheFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CacheFault {}

/// Errors surfaced by the verification-code and counter caches.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CacheError {
    /// Transport failure with no fallback value to recover to.
    #[error("Cache operation {operation} failed ({kind}): {reason}")]
    OperationFailed {
        /// The cache operation that failed
        operation: &'static str,
        /// Classified failure kind
        kind: FaultKind,
        /// Backend message
        reason: String,
    },

    /// Expected key is absent.
    #[error("Cache key not found: {key}")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// Hash exists but the field does not.
    #[error("Field {field} not found in {key}")]
    FieldNotFound {
        /// The hash key
        key: String,
        /// The missing field
        field: String,
    },

    /// Empty or otherwise unusable input.
    #[error("Invalid cache argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected
        reason: String,
    },

    /// No live verification code for the user.
    #[error("Verification code for {username} not found or expired")]
    CodeNotFoundOrExpired {
        /// The user whose code was looked up
        username: String,
    },

    /// Candidate code did not match the stored one.
    #[error("Verification code mismatch for {username}")]
    CodeMismatch {
        /// The user whose code was checked
        username: String,
    },
}

impl CacheError {
    /// Check if this error is a transport failure.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, CacheError::OperationFailed { .. })
    }

    /// Check if this error indicates a key or field was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CacheError::NotFound { .. } | CacheError::FieldNotFound { .. }
        )
    }

    /// Check if this error is specifically a missing hash field.
    pub fn is_field_not_found(&self) -> bool {
        matches!(self, CacheError::FieldNotFound { .. })
    }

    /// Check if this error rejected caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CacheError::InvalidArgument { .. })
    }

    /// Check if this error came from verification-code checking.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            CacheError::CodeNotFoundOrExpired { .. } | CacheError::CodeMismatch { .. }
        )
    }

    /// Check if the code was missing or expired.
    pub fn is_code_not_found(&self) -> bool {
        matches!(self, CacheError::CodeNotFoundOrExpired { .. })
    }

    /// Check if the code did not match.
    pub fn is_code_mismatch(&self) -> bool {
        matches!(self, CacheError::CodeMismatch { .. })
    }

    /// Fault class of a transport failure.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            CacheError::OperationFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<CacheError> for crate::Error {
    fn from(err: CacheError) -> Self {
        crate::Error::Cache(err)
    }
}
