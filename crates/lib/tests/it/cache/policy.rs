use std::time::Duration;

use exam_archive::cache::FaultKind;
use exam_archive::cache::policy::recover;
use exam_archive::cache::CacheFault;

use crate::context::TestContext;
use crate::helpers::Fault;

#[test]
fn recover_is_pure_over_fault_kind() {
    for kind in [
        FaultKind::ConnectionFailure,
        FaultKind::Timeout,
        FaultKind::Serialization,
        FaultKind::Other,
    ] {
        assert_eq!(recover("op", CacheFault::new(kind, "x"), Some(3)).unwrap(), 3);
        let err = recover::<u8>("op", CacheFault::new(kind, "x"), None).unwrap_err();
        assert!(err.is_cache_failure());
    }
}

#[tokio::test]
async fn existence_probe_falls_back_to_false() {
    let ctx = TestContext::new();
    let codes = ctx.codes();
    codes
        .issue("Jesse", "123456", Duration::from_secs(60))
        .await
        .unwrap();

    ctx.cache()
        .fail("exists", Fault::Fail(FaultKind::ConnectionFailure));
    assert!(!codes.is_live("Jesse").await.unwrap());
}

#[tokio::test]
async fn reads_without_fallback_raise_operation_failed() {
    let ctx = TestContext::new();
    ctx.cache().fail("get", Fault::Fail(FaultKind::Serialization));

    let err = ctx.codes().fetch("Jesse").await.unwrap_err();
    assert!(err.is_cache_failure());
    assert!(!err.is_verification_failure());
}

#[tokio::test(start_paused = true)]
async fn stalled_backend_times_out() {
    let ctx = TestContext::new();
    ctx.cache().fail("hash_get_all", Fault::Stall);

    let err = ctx.counters().bulk_read("Jesse").await.unwrap_err();
    assert!(err.is_cache_failure());
    assert!(err.is_timeout());
}
