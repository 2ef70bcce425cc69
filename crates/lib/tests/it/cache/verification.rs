use std::time::Duration;

use exam_archive::cache::FaultKind;

use crate::context::TestContext;
use crate::helpers::Fault;

const TTL: Duration = Duration::from_secs(300);

#[tokio::test]
async fn code_is_consumed_exactly_once() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    assert!(codes.issue("Jesse", "482913", TTL).await.unwrap());

    codes.consume("Jesse", "482913").await.unwrap();
    let err = codes.consume("Jesse", "482913").await.unwrap_err();
    assert!(err.is_code_not_found());
}

#[tokio::test]
async fn reissue_replaces_previous_code() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes.issue("Jesse", "111111", TTL).await.unwrap();
    codes.issue("Jesse", "222222", TTL).await.unwrap();

    assert_eq!(codes.fetch("Jesse").await.unwrap(), "222222");
    assert!(codes.consume("Jesse", "111111").await.unwrap_err().is_code_mismatch());
    codes.consume("Jesse", "222222").await.unwrap();
    assert!(!codes.is_live("Jesse").await.unwrap());
}

#[tokio::test]
async fn reissue_gets_a_fresh_ttl() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes
        .issue("Jesse", "111111", Duration::from_secs(60))
        .await
        .unwrap();
    ctx.advance(Duration::from_secs(50));
    codes
        .issue("Jesse", "222222", Duration::from_secs(60))
        .await
        .unwrap();

    ctx.advance(Duration::from_secs(30));
    assert_eq!(codes.fetch("Jesse").await.unwrap(), "222222");

    ctx.advance(Duration::from_secs(30));
    assert!(codes.fetch("Jesse").await.unwrap_err().is_code_not_found());
}

#[tokio::test]
async fn comparison_is_exact_and_case_sensitive() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes.issue("Jesse", "AbC123", TTL).await.unwrap();

    assert!(codes.consume("Jesse", "abc123").await.unwrap_err().is_code_mismatch());
    assert!(codes.consume("Jesse", "AbC123 ").await.unwrap_err().is_code_mismatch());
    codes.consume("Jesse", "AbC123").await.unwrap();
}

#[tokio::test]
async fn concurrent_consumers_only_one_wins() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes.issue("Jesse", "482913", TTL).await.unwrap();

    let (a, b) = tokio::join!(
        codes.consume("Jesse", "482913"),
        codes.consume("Jesse", "482913")
    );
    let wins = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(wins, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(loser.unwrap_err().is_code_not_found());
}

#[tokio::test]
async fn consume_on_absent_user_fails() {
    let ctx = TestContext::new();
    let err = ctx.codes().consume("nobody", "000000").await.unwrap_err();
    assert!(err.is_code_not_found());
}

#[tokio::test]
async fn users_do_not_share_codes() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes.issue("alice", "111111", TTL).await.unwrap();
    codes.issue("bob", "222222", TTL).await.unwrap();

    assert!(codes.consume("alice", "222222").await.unwrap_err().is_code_mismatch());
    codes.consume("bob", "222222").await.unwrap();
    assert!(codes.is_live("alice").await.unwrap());
}

#[tokio::test]
async fn issue_reports_false_when_cache_is_down() {
    let ctx = TestContext::new();
    ctx.cache()
        .fail("set_with_ttl", Fault::Fail(FaultKind::ConnectionFailure));

    assert!(!ctx.codes().issue("Jesse", "482913", TTL).await.unwrap());
    ctx.cache().heal();
    assert!(!ctx.codes().is_live("Jesse").await.unwrap());
}

#[tokio::test]
async fn failed_delete_does_not_count_as_consumed() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes.issue("Jesse", "482913", TTL).await.unwrap();

    ctx.cache().fail("delete", Fault::Fail(FaultKind::Timeout));
    let err = codes.consume("Jesse", "482913").await.unwrap_err();
    assert!(err.is_cache_failure());

    ctx.cache().heal();
    codes.consume("Jesse", "482913").await.unwrap();
}
