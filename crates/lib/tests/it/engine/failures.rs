use std::fs;

use async_trait::async_trait;
use exam_archive::cache::FaultKind;
use exam_archive::engine::SyncError;
use exam_archive::{
    ArchiveSyncEngine, AvatarBlob, CounterMap, DefaultAvatar, EngineConfig, Error, InMemoryCache,
    QuestionCatalog,
};
use std::sync::Arc;

use crate::context::TestContext;
use crate::helpers::Fault;

fn sync_error(err: &Error) -> &SyncError {
    match err {
        Error::Sync(sync) => sync,
        other => panic!("expected a sync error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_archive_does_not_touch_cache() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    let dir = ctx.archive_root().join("Jesse");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("correct_times.json"), "{ definitely not counters").unwrap();

    let err = engine.load_on_login("Jesse").await.unwrap_err();
    assert!(sync_error(&err).is_load_failed());
    assert!(ctx.cache().inner().is_empty().await);
}

#[tokio::test]
async fn missing_archive_is_not_found_on_login() {
    let ctx = TestContext::new();
    let err = ctx.engine().load_on_login("ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn failed_write_keeps_cache_authoritative() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    engine.create_for_new_user("Jesse").await.unwrap();
    engine.load_on_login("Jesse").await.unwrap();
    engine.counters().increment("Jesse", 1).await.unwrap();

    // Replace the archive directory with a plain file so the write fails.
    let dir = ctx.archive_root().join("Jesse");
    fs::remove_dir_all(&dir).unwrap();
    fs::write(&dir, "in the way").unwrap();

    let err = engine.flush_on_logout("Jesse").await.unwrap_err();
    assert!(err.is_archive_io_failure());
    let cached = engine.counters().bulk_read("Jesse").await.unwrap();
    assert_eq!(cached.get(&1), Some(&1));
}

#[tokio::test]
async fn logout_without_session_is_not_found() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    engine.create_for_new_user("Jesse").await.unwrap();
    let err = engine.flush_on_logout("Jesse").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn creation_failure_is_reported_with_cause() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    fs::create_dir_all(ctx.archive_root()).unwrap();
    fs::write(ctx.archive_root().join("Jesse"), "in the way").unwrap();

    let err = engine.create_for_new_user("Jesse").await.unwrap_err();
    match sync_error(&err) {
        SyncError::ArchiveCreationFailed { username, source } => {
            assert_eq!(username, "Jesse");
            assert!(source.is_archive_io_failure());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[derive(Debug)]
struct BrokenCatalog;

#[async_trait]
impl QuestionCatalog for BrokenCatalog {
    async fn question_count(&self) -> exam_archive::Result<u64> {
        Err(std::io::Error::other("catalog offline").into())
    }
}

#[tokio::test]
async fn catalog_failure_fails_creation() {
    let ctx = TestContext::new();
    let config = EngineConfig {
        archive_root: ctx.archive_root(),
        ..EngineConfig::default()
    };
    let engine = ArchiveSyncEngine::new(
        &config,
        Arc::new(InMemoryCache::new()),
        Arc::new(BrokenCatalog),
        DefaultAvatar::new(AvatarBlob::default()),
    );

    let err = engine.create_for_new_user("Jesse").await.unwrap_err();
    assert!(sync_error(&err).is_creation_failed());
    assert!(!ctx.archive_root().join("Jesse").exists());
}

#[derive(Debug)]
struct StalledCatalog;

#[async_trait]
impl QuestionCatalog for StalledCatalog {
    async fn question_count(&self) -> exam_archive::Result<u64> {
        tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60)).await;
        Ok(5)
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_catalog_fails_creation_with_cause() {
    let ctx = TestContext::new();
    let config = EngineConfig {
        archive_root: ctx.archive_root(),
        ..EngineConfig::default()
    };
    let engine = ArchiveSyncEngine::new(
        &config,
        Arc::new(InMemoryCache::new()),
        Arc::new(StalledCatalog),
        DefaultAvatar::new(AvatarBlob::default()),
    );

    let err = engine.create_for_new_user("Jesse").await.unwrap_err();
    match sync_error(&err) {
        SyncError::ArchiveCreationFailed { source, .. } => assert!(source.is_timeout()),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!ctx.archive_root().join("Jesse").exists());
}

#[tokio::test(start_paused = true)]
async fn slow_delete_finishes_every_step_and_reports_overrun() {
    let ctx = TestContext::new().with_config(|config| config.flow_timeout_secs = 2);
    let engine = ctx.engine();
    engine.create_for_new_user("Jesse").await.unwrap();
    engine.load_on_login("Jesse").await.unwrap();
    engine.issue_code("Jesse").await.unwrap().unwrap();

    let counters_key = ctx.keys().correct_times("Jesse").unwrap();
    ctx.cache().fail_key("delete", &counters_key, Fault::Stall);

    let err = engine.delete("Jesse").await.unwrap_err();
    let sync = sync_error(&err);
    assert!(sync.is_deletion_failed());
    assert_eq!(sync.failures().len(), 1);
    assert!(sync.failures()[0].is_timeout());

    // the code key behind the stalled one was still removed
    assert!(!ctx.archive_root().join("Jesse").exists());
    assert!(!engine.codes().is_live("Jesse").await.unwrap());
    ctx.cache().heal();
    assert!(ctx.counters().bulk_read("Jesse").await.is_ok());
}

#[tokio::test]
async fn delete_attempts_both_stores_and_aggregates() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    engine.create_for_new_user("Jesse").await.unwrap();
    engine.load_on_login("Jesse").await.unwrap();
    ctx.cache()
        .fail("scan", Fault::Fail(FaultKind::ConnectionFailure));

    let err = engine.delete("Jesse").await.unwrap_err();
    let sync = sync_error(&err);
    assert!(sync.is_deletion_failed());
    assert_eq!(sync.failures().len(), 1);
    assert!(sync.failures()[0].is_cache_failure());
    // the archive half still ran
    assert!(!ctx.archive_root().join("Jesse").exists());
}

#[tokio::test]
async fn delete_of_unknown_user_still_evicts_cache() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    ctx.counters()
        .bulk_load("ghost", &CounterMap::from([(0, 1)]))
        .await
        .unwrap();

    let err = engine.delete("ghost").await.unwrap_err();
    let sync = sync_error(&err);
    assert_eq!(sync.failures().len(), 1);
    assert!(sync.failures()[0].is_not_found());
    assert!(ctx.cache().inner().is_empty().await);
}

#[tokio::test]
async fn wrong_code_blocks_login() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    engine.create_for_new_user("Jesse").await.unwrap();
    engine.codes()
        .issue("Jesse", "482913", std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let err = engine.login_with_code("Jesse", "000000").await.unwrap_err();
    assert!(err.is_code_mismatch());
    assert!(engine.counters().bulk_read("Jesse").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn issue_code_reports_unavailable_cache() {
    let ctx = TestContext::new();
    ctx.cache()
        .fail("exists", Fault::Fail(FaultKind::ConnectionFailure));
    assert_eq!(ctx.engine().issue_code("Jesse").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn slow_flow_hits_flow_timeout() {
    let ctx = TestContext::new().with_config(|config| {
        config.cache_timeout_secs = 60;
        config.flow_timeout_secs = 1;
    });
    ctx.cache().fail("hash_get_all", Fault::Stall);

    let err = ctx.engine().flush_on_logout("Jesse").await.unwrap_err();
    assert!(sync_error(&err).is_timeout());
    assert!(err.is_timeout());
}

#[tokio::test]
async fn invalid_usernames_are_rejected_before_io() {
    let ctx = TestContext::new();
    let engine = ctx.engine();
    for bad in ["", "..", "a/b", "a:b", "*"] {
        assert!(engine.load_on_login(bad).await.unwrap_err().is_invalid_argument());
    }
    assert!(!ctx.archive_root().exists());
}
