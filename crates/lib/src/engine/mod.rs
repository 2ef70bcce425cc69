//! Archive synchronization at session boundaries.
//!
//! [`ArchiveSyncEngine`] moves a user's counters between the durable archive
//! and the session cache:
//!
//! ```text
//! NoArchive --create--> Provisioned --login--> Loaded <-> CacheDirty
//!                            ^                              |
//!                            +-----------logout-------------+
//! Provisioned --delete--> Deleted
//! ```
//!
//! The engine does not serialize operations for one user; callers guarantee
//! at most one active session per username. Flows are bounded by the
//! configured flow timeout. Creation and deletion touch two stores, so they are
//! never cancelled part-way: each step keeps its own cache or file bound, and an
//! overrun of the flow bound is reported alongside the other step failures.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument, info_span};

use crate::archive::{AvatarBlob, DefaultAvatar, FileArchiveStore, format};
use crate::cache::counters::CounterMap;
use crate::cache::{CacheBackend, CacheError, CounterCache, FaultKind, VerificationCodeCache};
use crate::config::EngineConfig;
use crate::constants::{AVATAR_FILE_NAME, CORRECT_TIMES_FILE_NAME, DELETE_ALL};
use crate::keys::{KeySpace, validate_username};
use crate::{Error, Result};

pub mod catalog;
pub mod errors;

pub use catalog::{FixedCatalog, QuestionCatalog};
pub use errors::SyncError;

/// Maps usernames to archive directories under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `username`'s archive.
    pub fn user_dir(&self, username: &str) -> Result<PathBuf> {
        validate_username(username)?;
        Ok(self.root.join(username))
    }
}

/// Proof that a user's counters file was just written.
///
/// Only [`ArchiveSyncEngine::write_counters`] constructs one, and eviction
/// after a flush consumes it, so a flush cannot evict before its write lands.
#[derive(Debug)]
#[must_use]
struct FlushReceipt {
    username: String,
    path: PathBuf,
}

/// Orchestrates the archive store and the session caches.
#[derive(Debug, Clone)]
pub struct ArchiveSyncEngine {
    layout: ArchiveLayout,
    store: FileArchiveStore,
    counters: CounterCache,
    codes: VerificationCodeCache,
    catalog: Arc<dyn QuestionCatalog>,
    default_avatar: DefaultAvatar,
    code_ttl: Duration,
    code_length: usize,
    flow_timeout: Duration,
}

impl ArchiveSyncEngine {
    /// Build an engine from `config` over the given cache backend and collaborators.
    pub fn new(
        config: &EngineConfig,
        backend: Arc<dyn CacheBackend>,
        catalog: Arc<dyn QuestionCatalog>,
        default_avatar: DefaultAvatar,
    ) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "Engine configured with inconsistent bounds");
        }
        let keys = KeySpace::new(config.key_root.clone());
        Self {
            layout: ArchiveLayout::new(config.archive_root.clone()),
            store: FileArchiveStore::new(config.blocking_workers, config.file_timeout()),
            counters: CounterCache::new(
                Arc::clone(&backend),
                keys.clone(),
                config.cache_timeout(),
            ),
            codes: VerificationCodeCache::new(backend, keys, config.cache_timeout()),
            catalog,
            default_avatar,
            code_ttl: config.verify_code_ttl(),
            code_length: config.verify_code_length,
            flow_timeout: config.flow_timeout(),
        }
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    pub fn store(&self) -> &FileArchiveStore {
        &self.store
    }

    pub fn counters(&self) -> &CounterCache {
        &self.counters
    }

    pub fn codes(&self) -> &VerificationCodeCache {
        &self.codes
    }

    /// The process-wide default avatar.
    pub fn default_avatar(&self) -> &AvatarBlob {
        self.default_avatar.blob()
    }

    async fn within<T>(
        &self,
        operation: &'static str,
        username: &str,
        flow: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let span = info_span!("archive_flow", operation, username);
        match tokio::time::timeout(self.flow_timeout, flow.instrument(span)).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(operation, username).into()),
        }
    }

    fn timed_out(&self, operation: &'static str, username: &str) -> SyncError {
        tracing::warn!(operation, username, "Archive flow timed out");
        SyncError::TimedOut {
            operation,
            username: username.to_string(),
            after: self.flow_timeout,
        }
    }

    async fn question_count(&self, username: &str) -> Result<u64> {
        match tokio::time::timeout(self.flow_timeout, self.catalog.question_count()).await {
            Ok(count) => count,
            Err(_) => Err(self.timed_out("create_for_new_user", username).into()),
        }
    }

    /// Seed a new user's archive with the default avatar and zeroed counters.
    ///
    /// A failure after the avatar write leaves the avatar in place. The catalog
    /// lookup is bounded by the flow timeout; the writes by the file timeout.
    pub async fn create_for_new_user(&self, username: &str) -> Result<()> {
        let span = info_span!("archive_flow", operation = "create_for_new_user", username);
        self.seed(username).instrument(span).await
    }

    async fn seed(&self, username: &str) -> Result<()> {
        let dir = self.layout.user_dir(username)?;
        let seeded = async {
            let count = self.question_count(username).await?;
            let avatar = self.default_avatar.blob().as_bytes();
            self.store
                .write_bytes(&dir, AVATAR_FILE_NAME, avatar)
                .await?;
            let counters = format::render(&format::zeroed(count))?;
            self.store
                .write_text(&dir, CORRECT_TIMES_FILE_NAME, &counters)
                .await?;
            tracing::info!(username, questions = count, "Archive created");
            Ok::<(), Error>(())
        }
        .await;

        seeded.map_err(|source| {
            Error::from(SyncError::ArchiveCreationFailed {
                username: username.to_string(),
                source: Box::new(source),
            })
        })
    }

    /// Mirror the user's counters file into the cache. Returns what was loaded.
    ///
    /// The cache is untouched when the file cannot be parsed.
    pub async fn load_on_login(&self, username: &str) -> Result<CounterMap> {
        self.within("load_on_login", username, self.load(username))
            .await
    }

    async fn load(&self, username: &str) -> Result<CounterMap> {
        let dir = self.layout.user_dir(username)?;
        let text = self.store.read_text(&dir, CORRECT_TIMES_FILE_NAME).await?;
        let counters = format::parse(&text).map_err(|e| SyncError::ArchiveLoadFailed {
            username: username.to_string(),
            reason: e.to_string(),
        })?;
        if counters.is_empty() {
            return Err(SyncError::ArchiveLoadFailed {
                username: username.to_string(),
                reason: "counters file has no entries".to_string(),
            }
            .into());
        }

        self.counters.bulk_load(username, &counters).await?;
        tracing::info!(username, questions = counters.len(), "Archive loaded into cache");
        Ok(counters)
    }

    /// Consume a verification code, then load the archive.
    pub async fn login_with_code(&self, username: &str, code: &str) -> Result<CounterMap> {
        self.within("login_with_code", username, async {
            self.codes.consume(username, code).await?;
            self.load(username).await
        })
        .await
    }

    /// Write the cached counters back to the archive, then evict the cache.
    ///
    /// If the write fails nothing is evicted.
    pub async fn flush_on_logout(&self, username: &str) -> Result<CounterMap> {
        self.within("flush_on_logout", username, async {
            let counters = self.counters.bulk_read(username).await?;
            let receipt = self.write_counters(username, &counters).await?;
            self.evict_flushed(receipt).await?;
            Ok(counters)
        })
        .await
    }

    async fn write_counters(&self, username: &str, counters: &CounterMap) -> Result<FlushReceipt> {
        let dir = self.layout.user_dir(username)?;
        let text = format::render(counters)?;
        let path = self
            .store
            .write_text(&dir, CORRECT_TIMES_FILE_NAME, &text)
            .await?;
        Ok(FlushReceipt {
            username: username.to_string(),
            path,
        })
    }

    async fn evict_flushed(&self, receipt: FlushReceipt) -> Result<()> {
        let FlushReceipt { username, path } = receipt;
        if !self.counters.evict(&username).await? {
            tracing::warn!(
                username = %username,
                path = %path.display(),
                "Flushed archive but cache eviction was skipped"
            );
        }
        Ok(())
    }

    /// Move `old`'s archive directory to `new`. Equal names are a no-op.
    ///
    /// Cache keys are not moved; callers flush `old` first.
    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.within("rename", old, async {
            let from = self.layout.user_dir(old)?;
            let to = self.layout.user_dir(new)?;
            self.store.rename(&from, &to).await?;
            tracing::info!(old, new, "Archive renamed");
            Ok(())
        })
        .await
    }

    /// Remove the user's archive directory and every cache key.
    ///
    /// Both are attempted; any failures are reported together. Running past the
    /// flow timeout is one more reported failure, not a cancellation.
    pub async fn delete(&self, username: &str) -> Result<()> {
        let span = info_span!("archive_flow", operation = "delete", username);
        self.purge(username).instrument(span).await
    }

    async fn purge(&self, username: &str) -> Result<()> {
        let dir = self.layout.user_dir(username)?;
        let started = Instant::now();
        let mut failures: Vec<Error> = Vec::new();

        if let Err(e) = self.store.delete(&dir, DELETE_ALL).await {
            failures.push(e);
        }
        match self.counters.evict(username).await {
            Ok(true) => {}
            Ok(false) => failures.push(
                CacheError::OperationFailed {
                    operation: "evict",
                    kind: FaultKind::Other,
                    reason: format!("could not scan cache keys of {username}"),
                }
                .into(),
            ),
            Err(e) => failures.push(e),
        }
        if started.elapsed() > self.flow_timeout {
            failures.push(self.timed_out("delete", username).into());
        }

        if failures.is_empty() {
            tracing::info!(username, "Archive and cache deleted");
            Ok(())
        } else {
            Err(SyncError::ArchiveDeletionFailed {
                username: username.to_string(),
                failures,
            }
            .into())
        }
    }

    /// The user's stored avatar.
    pub async fn avatar(&self, username: &str) -> Result<AvatarBlob> {
        self.within("avatar", username, async {
            let dir = self.layout.user_dir(username)?;
            let bytes = self.store.read_bytes(&dir, AVATAR_FILE_NAME).await?;
            Ok(AvatarBlob::from(bytes))
        })
        .await
    }

    /// Overwrite the user's avatar.
    pub async fn set_avatar(&self, username: &str, avatar: &AvatarBlob) -> Result<()> {
        self.within("set_avatar", username, async {
            let dir = self.layout.user_dir(username)?;
            self.store
                .write_bytes(&dir, AVATAR_FILE_NAME, avatar.as_bytes())
                .await?;
            Ok(())
        })
        .await
    }

    /// Issue a fresh verification code and return it.
    ///
    /// `None` when the cache could not store it.
    pub async fn issue_code(&self, username: &str) -> Result<Option<String>> {
        self.within("issue_code", username, async {
            let code = VerificationCodeCache::generate(self.code_length);
            let issued = self.codes.issue(username, &code, self.code_ttl).await?;
            Ok(issued.then_some(code))
        })
        .await
    }

    /// Usernames that currently hold cache state.
    pub async fn active_users(&self) -> Result<Vec<String>> {
        self.within("active_users", "*", self.counters.cached_users())
            .await
    }
}
