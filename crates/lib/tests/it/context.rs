//! Test context for managing test setup and lifecycle.
//!
//! Each context owns a temporary archive root, a manually driven clock and a
//! fault-injecting cache, and builds an engine over them. The temporary
//! directory lives as long as the context.

use std::sync::Arc;
use std::time::Duration;

use exam_archive::cache::{CounterCache, VerificationCodeCache};
use exam_archive::{
    ArchiveSyncEngine, AvatarBlob, DefaultAvatar, EngineConfig, FixedCatalog, KeySpace,
    ManualClock,
};
use tempfile::TempDir;

use crate::helpers::FaultyCache;

pub const DEFAULT_AVATAR: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a];

pub struct TestContext {
    _dir: TempDir,
    clock: Arc<ManualClock>,
    cache: Arc<FaultyCache>,
    config: EngineConfig,
    questions: u64,
}

impl TestContext {
    /// A context with a 5-question catalog and default timeouts.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = Arc::new(FaultyCache::new(clock.clone()));
        let config = EngineConfig {
            archive_root: dir.path().join("archives"),
            ..EngineConfig::default()
        };
        Self {
            _dir: dir,
            clock,
            cache,
            config,
            questions: 5,
        }
    }

    pub fn with_questions(mut self, questions: u64) -> Self {
        self.questions = questions;
        self
    }

    pub fn with_config(mut self, edit: impl FnOnce(&mut EngineConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn engine(&self) -> ArchiveSyncEngine {
        ArchiveSyncEngine::new(
            &self.config,
            self.cache.clone(),
            Arc::new(FixedCatalog(self.questions)),
            DefaultAvatar::new(AvatarBlob::new(DEFAULT_AVATAR)),
        )
    }

    pub fn codes(&self) -> VerificationCodeCache {
        VerificationCodeCache::new(self.cache.clone(), self.keys(), self.config.cache_timeout())
    }

    pub fn counters(&self) -> CounterCache {
        CounterCache::new(self.cache.clone(), self.keys(), self.config.cache_timeout())
    }

    pub fn keys(&self) -> KeySpace {
        KeySpace::new(self.config.key_root.clone())
    }

    pub fn cache(&self) -> &FaultyCache {
        &self.cache
    }

    pub fn archive_root(&self) -> std::path::PathBuf {
        self.config.archive_root.clone()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by.as_millis() as u64);
    }
}
