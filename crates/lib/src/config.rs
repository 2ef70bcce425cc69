//! Engine configuration.
//!
//! Loaded from an optional JSON file; absent fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};
use crate::constants::{
    BLOCKING_WORKERS, CACHE_TIMEOUT, DEFAULT_KEY_ROOT, FILE_TIMEOUT, FLOW_TIMEOUT,
    VERIFY_CODE_LENGTH, VERIFY_CODE_TTL,
};

/// Settings for an [`crate::ArchiveSyncEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one sub-directory per user.
    pub archive_root: PathBuf,
    /// Image seeded into new archives. Empty when unset.
    pub default_avatar_path: Option<PathBuf>,
    /// Namespace root of cache keys.
    pub key_root: String,
    pub verify_code_ttl_secs: u64,
    pub verify_code_length: usize,
    pub cache_timeout_secs: u64,
    pub file_timeout_secs: u64,
    pub flow_timeout_secs: u64,
    /// Concurrent blocking filesystem jobs.
    pub blocking_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("./archives"),
            default_avatar_path: None,
            key_root: DEFAULT_KEY_ROOT.to_string(),
            verify_code_ttl_secs: VERIFY_CODE_TTL.as_secs(),
            verify_code_length: VERIFY_CODE_LENGTH,
            cache_timeout_secs: CACHE_TIMEOUT.as_secs(),
            file_timeout_secs: FILE_TIMEOUT.as_secs(),
            flow_timeout_secs: FLOW_TIMEOUT.as_secs(),
            blocking_workers: BLOCKING_WORKERS,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check that the bounds fit together.
    ///
    /// Every bound must be non-zero, and a flow must have room for at least one
    /// file step plus one cache step.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(Error::Config { reason });
        if self.cache_timeout_secs == 0 || self.file_timeout_secs == 0 || self.flow_timeout_secs == 0 {
            return invalid("timeouts must be at least one second".to_string());
        }
        if self.blocking_workers == 0 {
            return invalid("blocking_workers must be at least 1".to_string());
        }
        if self.verify_code_length == 0 {
            return invalid("verify_code_length must be at least 1".to_string());
        }
        let step = self.cache_timeout_secs.saturating_add(self.file_timeout_secs);
        if self.flow_timeout_secs < step {
            return invalid(format!(
                "flow_timeout_secs ({}) is shorter than cache_timeout_secs + file_timeout_secs ({step})",
                self.flow_timeout_secs
            ));
        }
        Ok(())
    }

    pub fn verify_code_ttl(&self) -> Duration {
        Duration::from_secs(self.verify_code_ttl_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    pub fn flow_timeout(&self) -> Duration {
        Duration::from_secs(self.flow_timeout_secs)
    }
}
