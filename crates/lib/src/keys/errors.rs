//! Error types for cache key construction.

use thiserror::Error;

/// Errors raised while turning a username into cache keys or archive paths.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KeyError {
    /// Username cannot be used as a key or directory segment.
    #[error("Invalid username {username:?}: {reason}")]
    InvalidUsername {
        /// The rejected username
        username: String,
        /// Why it was rejected
        reason: &'static str,
    },
}

impl KeyError {
    /// Check if this error is an invalid-argument rejection.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, KeyError::InvalidUsername { .. })
    }
}

impl From<KeyError> for crate::Error {
    fn from(err: KeyError) -> Self {
        crate::Error::Key(err)
    }
}
