use exam_archive::KeySpace;
use exam_archive::keys::{SubKey, build};

#[test]
fn same_inputs_same_key() {
    let first = build("user", "Jesse", SubKey::VerifyCode).unwrap();
    let second = build("user", "Jesse", SubKey::VerifyCode).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "user:Jesse:verify-code");
}

#[test]
fn distinct_users_have_disjoint_keys() {
    let keys = KeySpace::default();
    let jesse = [
        keys.correct_times("Jesse").unwrap(),
        keys.verify_code("Jesse").unwrap(),
    ];
    let jess = [
        keys.correct_times("Jess").unwrap(),
        keys.verify_code("Jess").unwrap(),
    ];
    for key in &jesse {
        assert!(!jess.contains(key));
    }
}

#[test]
fn user_pattern_does_not_cover_prefix_sharing_users() {
    let keys = KeySpace::default();
    let pattern = keys.user_pattern("Jess").unwrap();
    let other = keys.verify_code("Jesse").unwrap();
    assert!(!other.starts_with(pattern.trim_end_matches('*')));
}

#[test]
fn custom_root_is_respected() {
    let keys = KeySpace::new("exam");
    assert_eq!(
        keys.key("alice", SubKey::QuesCorrectTimes).unwrap(),
        "exam:alice:ques-correct-times"
    );
    assert_eq!(keys.all_users_pattern(), "exam:*");
    assert_eq!(keys.root(), "exam");
}

#[test]
fn separator_in_username_is_invalid_argument() {
    let err = KeySpace::default().verify_code("a:b").unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(err.module(), "keys");
}
