//! Isolation behavior of both read policies.

use mvkv_common::error::KvError;
use mvkv_common::types::IsolationLevel;
use mvkv_test::utils::{commit_one, test_store, test_store_with, value};

const SUPPORTED: [IsolationLevel; 2] = [IsolationLevel::ReadCommitted, IsolationLevel::RepeatableRead];

#[test]
fn test_read_your_writes_under_both_policies() {
    for level in SUPPORTED {
        let store = test_store();
        commit_one(&store, "x", "committed");

        let txn = store.begin_with_isolation(level).unwrap();
        store.write(txn, "x".to_string(), value("mine")).unwrap();
        store.write(txn, "y".to_string(), value("new")).unwrap();

        assert_eq!(store.read(Some(txn), "x").unwrap(), Some(value("mine")), "{level}");
        assert_eq!(store.read(Some(txn), "y").unwrap(), Some(value("new")), "{level}");

        // Other readers still see the committed state.
        assert_eq!(store.read(None, "x").unwrap(), Some(value("committed")));
        assert_eq!(store.read(None, "y").unwrap(), None);

        store.rollback(txn).unwrap();
    }
}

#[test]
fn test_commit_makes_all_writes_visible() {
    let store = test_store();

    let writer = store.begin().unwrap();
    for k in ["a", "b", "c"] {
        store.write(writer, k.to_string(), value("v1")).unwrap();
    }

    let rc_reader = store.begin_with_isolation(IsolationLevel::ReadCommitted).unwrap();
    for k in ["a", "b", "c"] {
        assert_eq!(store.read(Some(rc_reader), k).unwrap(), None);
    }

    store.commit(writer).unwrap();

    // New read-committed reads and new snapshots both see every write.
    let snapshot = store.begin_with_isolation(IsolationLevel::RepeatableRead).unwrap();
    for k in ["a", "b", "c"] {
        assert_eq!(store.read(Some(rc_reader), k).unwrap(), Some(value("v1")));
        assert_eq!(store.read(Some(snapshot), k).unwrap(), Some(value("v1")));
        assert_eq!(store.read_latest(k), Some(value("v1")));
    }
}

#[test]
fn test_rollback_is_invisible_everywhere() {
    let store = test_store();
    commit_one(&store, "x", "before");

    let early_snapshot = store.begin_with_isolation(IsolationLevel::RepeatableRead).unwrap();
    let rc_reader = store.begin_with_isolation(IsolationLevel::ReadCommitted).unwrap();

    let doomed = store.begin().unwrap();
    store.write(doomed, "x".to_string(), value("doomed")).unwrap();
    store.write(doomed, "z".to_string(), value("doomed")).unwrap();
    store.rollback(doomed).unwrap();

    let late_snapshot = store.begin_with_isolation(IsolationLevel::RepeatableRead).unwrap();

    for txn in [early_snapshot, rc_reader, late_snapshot] {
        assert_eq!(store.read(Some(txn), "x").unwrap(), Some(value("before")));
        assert_eq!(store.read(Some(txn), "z").unwrap(), None);
    }
    assert_eq!(store.read_latest("z"), None);
    assert!(!store.manager().version_store().contains_key("z"));
}

#[test]
fn test_repeatable_read_is_stable() {
    let store = test_store();
    commit_one(&store, "k", "old");

    let reader = store.begin_with_isolation(IsolationLevel::RepeatableRead).unwrap();
    assert_eq!(store.read(Some(reader), "k").unwrap(), Some(value("old")));

    commit_one(&store, "k", "new");
    commit_one(&store, "other", "new");

    assert_eq!(store.read(Some(reader), "k").unwrap(), Some(value("old")));
    assert_eq!(store.read(Some(reader), "other").unwrap(), None);
    store.commit(reader).unwrap();
}

#[test]
fn test_read_committed_sees_intervening_commit() {
    let store = test_store();
    commit_one(&store, "k", "old");

    let reader = store.begin_with_isolation(IsolationLevel::ReadCommitted).unwrap();
    assert_eq!(store.read(Some(reader), "k").unwrap(), Some(value("old")));

    commit_one(&store, "k", "new");

    assert_eq!(store.read(Some(reader), "k").unwrap(), Some(value("new")));
    store.commit(reader).unwrap();
}

#[test]
fn test_snapshot_scenario() {
    let store = test_store_with(IsolationLevel::RepeatableRead);

    let t1 = store.begin().unwrap();
    store.write(t1, "x".to_string(), value("A")).unwrap();
    store.commit(t1).unwrap();

    let t2 = store.begin().unwrap();

    let t3 = store.begin().unwrap();
    store.write(t3, "x".to_string(), value("B")).unwrap();
    store.commit(t3).unwrap();

    assert_eq!(store.read(Some(t2), "x").unwrap(), Some(value("A")));

    let t4 = store.begin().unwrap();
    assert_eq!(store.read(Some(t4), "x").unwrap(), Some(value("B")));
}

#[test]
fn test_read_committed_scenario() {
    let store = test_store();

    let t1 = store.begin().unwrap();
    store.write(t1, "x".to_string(), value("A")).unwrap();

    let t5 = store.begin_with_isolation(IsolationLevel::ReadCommitted).unwrap();
    assert_eq!(store.read(Some(t5), "x").unwrap(), None);

    store.commit(t1).unwrap();
    assert_eq!(store.read(Some(t5), "x").unwrap(), Some(value("A")));
}

#[test]
fn test_ad_hoc_read_uses_latest_commit() {
    let store = test_store();
    assert_eq!(store.read(None, "x").unwrap(), None);

    commit_one(&store, "x", "1");
    let pending = store.begin().unwrap();
    store.write(pending, "x".to_string(), value("2")).unwrap();

    assert_eq!(store.read(None, "x").unwrap(), Some(value("1")));
    store.commit(pending).unwrap();
    assert_eq!(store.read(None, "x").unwrap(), Some(value("2")));
}

#[test]
fn test_finished_ids_do_not_fall_back_to_ad_hoc_reads() {
    let store = test_store();
    commit_one(&store, "x", "1");

    let txn = store.begin().unwrap();
    store.commit(txn).unwrap();

    let err = store.read(Some(txn), "x").unwrap_err();
    assert!(matches!(err, KvError::TransactionNotActive { txn_id } if txn_id == txn));
    assert!(err.is_rejection());
}

#[test]
fn test_harness_selectors() {
    let store = test_store();

    for (selector, expected) in [
        ("READ COMMITTED", Some(IsolationLevel::ReadCommitted)),
        ("REPEATABLE READ", Some(IsolationLevel::RepeatableRead)),
        ("snapshot", Some(IsolationLevel::RepeatableRead)),
        ("READ UNCOMMITTED", None),
        ("SERIALIZABLE", None),
    ] {
        let level: IsolationLevel = selector.parse().unwrap();
        match (store.begin_with_isolation(level), expected) {
            (Ok(txn), Some(expected)) => {
                let info = store.manager().get_transaction(txn).unwrap();
                assert_eq!(info.isolation, expected);
                store.rollback(txn).unwrap();
            }
            (Err(KvError::UnsupportedIsolation { level: rejected }), None) => {
                assert_eq!(rejected, level);
            }
            (other, _) => panic!("unexpected outcome for {selector}: {other:?}"),
        }
    }

    assert_eq!(store.manager().active_count(), 0);
}
