//! Tests for LeaseTable
//!
//! These tests verify:
//! - Field reads and writes inside transactions
//! - Per-key expiry (lazy and purged)
//! - Concurrent transactions

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chanlease::table::LeaseTable;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_table_is_empty() {
    let table = LeaseTable::new();

    assert!(table.is_empty());
    assert_eq!(table.hmget(b"missing", &["a", "b"]), vec![None, None]);
    assert_eq!(table.ttl(b"missing"), None);
}

#[test]
fn test_hset_then_hmget() {
    let table = LeaseTable::new();

    table.transaction(|txn| txn.hset(b"k", &[("a", "1"), ("b", "2")]));

    assert_eq!(
        table.hmget(b"k", &["a", "b", "c"]),
        vec![Some("1".to_string()), Some("2".to_string()), None]
    );
    assert_eq!(table.len(), 1);
}

#[test]
fn test_hset_without_expire_never_expires() {
    let table = LeaseTable::new();

    table.transaction(|txn| txn.hset(b"k", &[("a", "1")]));

    assert_eq!(table.ttl(b"k"), Some(None));
}

#[test]
fn test_expire_on_missing_key_returns_false() {
    let table = LeaseTable::new();

    let applied = table.transaction(|txn| txn.expire(b"k", Duration::from_secs(1)));

    assert!(!applied);
    assert!(table.is_empty());
}

#[test]
fn test_del() {
    let table = LeaseTable::new();

    table.transaction(|txn| txn.hset(b"k", &[("a", "1")]));

    assert!(table.transaction(|txn| txn.del(b"k")));
    assert!(!table.transaction(|txn| txn.del(b"k")));
    assert!(table.is_empty());
}

#[test]
fn test_transaction_sees_its_own_writes() {
    let table = LeaseTable::new();

    let seen = table.transaction(|txn| {
        txn.hset(b"k", &[("a", "1")]);
        (txn.exists(b"k"), txn.hget(b"k", "a"))
    });

    assert_eq!(seen, (true, Some("1".to_string())));
}

// =============================================================================
// Expiry Tests
// =============================================================================

#[test]
fn test_ttl_reports_remaining_time() {
    let table = LeaseTable::new();

    table.transaction(|txn| {
        txn.hset(b"k", &[("a", "1")]);
        txn.expire(b"k", Duration::from_secs(10))
    });

    let left = table.ttl(b"k").unwrap().unwrap();
    assert!(left <= Duration::from_secs(10));
    assert!(left > Duration::from_secs(9));
}

#[test]
fn test_expired_record_is_invisible() {
    let table = LeaseTable::new();

    table.transaction(|txn| {
        txn.hset(b"k", &[("a", "1")]);
        txn.expire(b"k", Duration::from_millis(20))
    });
    thread::sleep(Duration::from_millis(60));

    assert_eq!(table.hmget(b"k", &["a"]), vec![None]);
    assert_eq!(table.ttl(b"k"), None);
    assert!(!table.transaction(|txn| txn.exists(b"k")));
    assert_eq!(table.len(), 0);
}

#[test]
fn test_hset_after_expiry_starts_fresh_record() {
    let table = LeaseTable::new();

    table.transaction(|txn| {
        txn.hset(b"k", &[("a", "old"), ("b", "old")]);
        txn.expire(b"k", Duration::from_millis(20))
    });
    thread::sleep(Duration::from_millis(60));

    table.transaction(|txn| txn.hset(b"k", &[("a", "new")]));

    assert_eq!(
        table.hmget(b"k", &["a", "b"]),
        vec![Some("new".to_string()), None]
    );
    assert_eq!(table.ttl(b"k"), Some(None));
}

#[test]
fn test_purge_expired_removes_only_expired() {
    let table = LeaseTable::new();

    table.transaction(|txn| {
        txn.hset(b"short", &[("a", "1")]);
        txn.expire(b"short", Duration::from_millis(20));
        txn.hset(b"long", &[("a", "1")]);
        txn.expire(b"long", Duration::from_secs(60));
        txn.hset(b"forever", &[("a", "1")]);
    });
    thread::sleep(Duration::from_millis(60));

    assert_eq!(table.raw_len(), 3);
    assert_eq!(table.purge_expired(), 1);
    assert_eq!(table.raw_len(), 2);
    assert_eq!(table.purge_expired(), 0);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_check_then_set_creates_once() {
    let table = Arc::new(LeaseTable::new());

    let mut handles = vec![];

    for i in 0..16 {
        let t = Arc::clone(&table);
        let handle = thread::spawn(move || {
            let me = format!("node{}", i);
            t.transaction(|txn| {
                if !txn.exists(b"k") {
                    txn.hset(b"k", &[("owner", me.as_str())]);
                }
                txn.hget(b"k", "owner")
            })
        });
        handles.push(handle);
    }

    let owners: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = owners[0].clone();

    assert!(first.is_some());
    assert!(owners.iter().all(|o| *o == first));
}

#[test]
fn test_concurrent_reads() {
    let table = Arc::new(LeaseTable::new());
    table.transaction(|txn| txn.hset(b"k", &[("a", "1")]));

    let mut handles = vec![];

    for _ in 0..10 {
        let t = Arc::clone(&table);
        let handle = thread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(t.hmget(b"k", &["a"]), vec![Some("1".to_string())]);
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
