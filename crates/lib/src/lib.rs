//!
//! Exam Archive: per-user archive synchronization and verification-code cache.
//!
//! ## Core Concepts
//!
//! * **Archives (`archive::FileArchiveStore`)**: One directory per user holding an
//!   avatar image and a JSON counters file, written through a bounded blocking pool.
//! * **Cache backends (`cache::CacheBackend`)**: A TTL-aware key/value and hash store,
//!   in memory or on Redis.
//! * **Key space (`keys::KeySpace`)**: Cache keys are `<root>:<username>:<subkey>`.
//! * **Counter cache (`cache::CounterCache`)**: The session copy of a user's
//!   per-question correct-answer counts.
//! * **Verification codes (`cache::VerificationCodeCache`)**: Short-lived codes
//!   consumed exactly once.
//! * **Sync engine (`engine::ArchiveSyncEngine`)**: Moves counters between archive
//!   and cache at registration, login, logout, rename and deletion.
//!
//! Every cache failure passes through `cache::policy`, which either recovers to a
//! fallback value or raises a typed [`Error`].

pub mod archive;
pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod engine;
pub mod keys;

pub use archive::{AvatarBlob, DefaultAvatar, FileArchiveStore};
pub use cache::counters::CounterMap;
pub use cache::{CacheBackend, CounterCache, InMemoryCache, VerificationCodeCache};
#[cfg(feature = "redis")]
pub use cache::RedisCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{ArchiveSyncEngine, FixedCatalog, QuestionCatalog};
pub use keys::KeySpace;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// Structured key errors from the keys module
    #[error(transparent)]
    Key(keys::KeyError),

    /// Structured cache errors from the cache module
    #[error(transparent)]
    Cache(cache::CacheError),

    /// Structured archive errors from the archive module
    #[error(transparent)]
    Archive(archive::ArchiveError),

    /// Structured flow errors from the engine module
    #[error(transparent)]
    Sync(engine::SyncError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Config { .. } => "config",
            Error::Key(_) => "keys",
            Error::Cache(_) => "cache",
            Error::Archive(_) => "archive",
            Error::Sync(_) => "engine",
        }
    }

    /// Check if this error indicates a key, field or file was absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Cache(cache_err) => cache_err.is_not_found(),
            Error::Archive(archive_err) => archive_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is specifically a missing counter field.
    pub fn is_field_not_found(&self) -> bool {
        match self {
            Error::Cache(cache_err) => cache_err.is_field_not_found(),
            _ => false,
        }
    }

    /// Check if this error rejected caller input.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Error::Key(key_err) => key_err.is_invalid_argument(),
            Error::Cache(cache_err) => cache_err.is_invalid_argument(),
            Error::Archive(archive_err) => archive_err.is_invalid_argument(),
            _ => false,
        }
    }

    /// Check if this error is a cache transport failure.
    pub fn is_cache_failure(&self) -> bool {
        match self {
            Error::Cache(cache_err) => cache_err.is_operation_failed(),
            _ => false,
        }
    }

    /// Check if this error is a filesystem failure.
    pub fn is_archive_io_failure(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Archive(archive_err) => archive_err.is_io_failure(),
            _ => false,
        }
    }

    /// Check if this error came from verification-code checking.
    pub fn is_verification_failure(&self) -> bool {
        match self {
            Error::Cache(cache_err) => cache_err.is_verification_failure(),
            _ => false,
        }
    }

    /// Check if no live verification code was found.
    pub fn is_code_not_found(&self) -> bool {
        match self {
            Error::Cache(cache_err) => cache_err.is_code_not_found(),
            _ => false,
        }
    }

    /// Check if a verification code did not match.
    pub fn is_code_mismatch(&self) -> bool {
        match self {
            Error::Cache(cache_err) => cache_err.is_code_mismatch(),
            _ => false,
        }
    }

    /// Check if this error rejected a configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config { .. })
    }

    /// Check if this error is a compound flow failure from the engine.
    pub fn is_sync_error(&self) -> bool {
        matches!(self, Error::Sync(_))
    }

    /// Check if a bounded operation timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Archive(archive_err) => archive_err.is_timeout(),
            Error::Sync(sync_err) => sync_err.is_timeout(),
            Error::Cache(cache_err) => {
                cache_err.fault_kind() == Some(cache::FaultKind::Timeout)
            }
            _ => false,
        }
    }
}
