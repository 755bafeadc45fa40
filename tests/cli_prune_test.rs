//! Integration tests for `ecfg prune`.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn sample() -> TestEnv {
    TestEnv::with_keys(&[
        ("/app/A", "1"),
        ("/app/B", "2"),
        ("/app/Z", "3"),
        ("/app/eu/Z", "4"),
        ("/other/Z", "5"),
    ])
}

#[test]
fn test_prune_deletes_undeclared_leaves() {
    let env = sample();
    env.ecfg()
        .args(["prune", "/app", "--keep", "A", "--keep", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""pruned":["/app/Z","/app/eu/Z"]"#));

    let keys = env.keys();
    assert!(keys.contains_key("/app/A"));
    assert!(keys.contains_key("/app/B"));
    assert!(!keys.contains_key("/app/Z"));
    assert!(!keys.contains_key("/app/eu/Z"));
    assert!(keys.contains_key("/other/Z"));
}

#[test]
fn test_prune_dry_run_keeps_everything() {
    let env = sample();
    let before = env.keys();
    env.ecfg()
        .args(["prune", "/app", "-k", "A", "-k", "B", "--dry-run", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete 2 key(s):"))
        .stdout(predicate::str::contains("/app/eu/Z"));
    assert_eq!(env.keys(), before);
}

#[test]
fn test_prune_nothing_to_do() {
    let env = TestEnv::with_keys(&[("/app/A", "1")]);
    env.ecfg()
        .args(["prune", "/app", "-k", "A", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to prune under /app"));
}

#[test]
fn test_prune_requires_keep() {
    let env = sample();
    env.ecfg().args(["prune", "/app"]).assert().failure();
    assert_eq!(env.keys().len(), 5);
}
