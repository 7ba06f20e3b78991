//! Tests for Engine
//!
//! These tests verify:
//! - Each atomic procedure against absent, held, and expired records
//! - Fencing: mismatched tokens leave the record and its TTL untouched
//! - Command routing
//! - Concurrent get-or-create on one key
//! - The reaper

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chanlease::engine::{Engine, FIELD_LEADERSHIP, FIELD_NODE};
use chanlease::protocol::{Command, Reply};
use chanlease::{LeaderError, Reaper};

// =============================================================================
// Helper Functions
// =============================================================================

fn pair(node: &str, token: &str) -> Reply {
    Reply::Array(vec![Some(node.to_string()), Some(token.to_string())])
}

fn ttl_ms(engine: &Engine, key: &[u8]) -> i64 {
    match engine.ttl(key) {
        Reply::Integer(ms) => ms,
        other => panic!("Expected integer, got {:?}", other),
    }
}

// =============================================================================
// Get-or-Create Tests
// =============================================================================

#[test]
fn test_get_or_create_on_absent_key_creates() {
    let engine = Engine::new();

    let reply = engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();

    assert_eq!(reply, pair("A", "tok1"));
    assert_eq!(engine.read(b"ch"), pair("A", "tok1"));
    assert_eq!(engine.lease_count(), 1);
}

#[test]
fn test_get_or_create_sets_expiry() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();

    let left = ttl_ms(&engine, b"ch");
    assert!(left > 9_000 && left <= 10_000, "ttl was {}", left);
}

#[test]
fn test_get_or_create_on_held_key_returns_existing() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();
    let reply = engine.get_or_create(b"ch", 10_000, "B", "tok2").unwrap();

    assert_eq!(reply, pair("A", "tok1"));
    assert_eq!(engine.read(b"ch"), pair("A", "tok1"));
}

#[test]
fn test_get_or_create_does_not_extend_existing_lease() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 200, "A", "tok1").unwrap();
    thread::sleep(Duration::from_millis(50));
    engine.get_or_create(b"ch", 10_000, "B", "tok2").unwrap();

    assert!(ttl_ms(&engine, b"ch") <= 200);
}

#[test]
fn test_get_or_create_after_expiry_creates_new_term() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 20, "A", "tok1").unwrap();
    thread::sleep(Duration::from_millis(60));
    let reply = engine.get_or_create(b"ch", 10_000, "B", "tok2").unwrap();

    assert_eq!(reply, pair("B", "tok2"));
}

#[test]
fn test_get_or_create_rejects_zero_ttl() {
    let engine = Engine::new();

    let result = engine.get_or_create(b"ch", 0, "A", "tok1");

    assert!(matches!(result, Err(LeaderError::StoreRejected(_))));
    assert_eq!(engine.lease_count(), 0);
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[test]
fn test_refresh_with_matching_token_extends() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 100, "A", "tok1").unwrap();
    let reply = engine.refresh(b"ch", 10_000, "tok1").unwrap();

    assert_eq!(reply, Reply::Integer(1));
    assert!(ttl_ms(&engine, b"ch") > 9_000);
    assert_eq!(engine.read(b"ch"), pair("A", "tok1"));
}

#[test]
fn test_refresh_with_wrong_token_changes_nothing() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 5_000, "A", "tok1").unwrap();
    let before = ttl_ms(&engine, b"ch");
    let reply = engine.refresh(b"ch", 60_000, "tok2").unwrap();

    assert_eq!(reply, Reply::Integer(0));
    assert_eq!(engine.read(b"ch"), pair("A", "tok1"));
    assert!(ttl_ms(&engine, b"ch") <= before);
}

#[test]
fn test_refresh_on_absent_key() {
    let engine = Engine::new();

    assert_eq!(engine.refresh(b"ch", 10_000, "tok1").unwrap(), Reply::Integer(0));
    assert_eq!(engine.lease_count(), 0);
}

#[test]
fn test_refresh_after_expiry_fails() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 20, "A", "tok1").unwrap();
    thread::sleep(Duration::from_millis(60));

    assert_eq!(engine.refresh(b"ch", 10_000, "tok1").unwrap(), Reply::Integer(0));
    assert_eq!(engine.read(b"ch"), Reply::Array(vec![None, None]));
}

#[test]
fn test_refresh_never_rotates_token() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();
    for _ in 0..5 {
        engine.refresh(b"ch", 10_000, "tok1").unwrap();
    }

    assert_eq!(engine.read(b"ch"), pair("A", "tok1"));
}

// =============================================================================
// Clean Tests
// =============================================================================

#[test]
fn test_clean_with_matching_token_deletes() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();

    assert_eq!(engine.clean(b"ch", "tok1"), Reply::Integer(1));
    assert_eq!(engine.read(b"ch"), Reply::Array(vec![None, None]));
    assert_eq!(ttl_ms(&engine, b"ch"), -2);
}

#[test]
fn test_clean_with_wrong_token_keeps_record() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();

    assert_eq!(engine.clean(b"ch", "tok2"), Reply::Integer(0));
    assert_eq!(engine.read(b"ch"), pair("A", "tok1"));
}

#[test]
fn test_stale_clean_cannot_delete_new_term() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 20, "A", "tok1").unwrap();
    thread::sleep(Duration::from_millis(60));
    engine.get_or_create(b"ch", 10_000, "B", "tok2").unwrap();

    // A still believes it leads and tries to release
    assert_eq!(engine.clean(b"ch", "tok1"), Reply::Integer(0));
    assert_eq!(engine.read(b"ch"), pair("B", "tok2"));
}

#[test]
fn test_clean_on_absent_key() {
    let engine = Engine::new();

    assert_eq!(engine.clean(b"ch", "tok1"), Reply::Integer(0));
}

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_execute_routes_commands() {
    let engine = Engine::new();

    assert_eq!(
        engine.execute(Command::Ping).unwrap(),
        Reply::Status("PONG".to_string())
    );

    let created = engine
        .execute(Command::GetOrCreate {
            key: b"ch".to_vec(),
            ttl_ms: 10_000,
            node_id: "A".to_string(),
            leadership_id: "tok1".to_string(),
        })
        .unwrap();
    assert_eq!(created, pair("A", "tok1"));

    let read = engine.execute(Command::Read { key: b"ch".to_vec() }).unwrap();
    assert_eq!(read, pair("A", "tok1"));

    let refreshed = engine
        .execute(Command::Refresh {
            key: b"ch".to_vec(),
            ttl_ms: 10_000,
            leadership_id: "tok1".to_string(),
        })
        .unwrap();
    assert_eq!(refreshed, Reply::Integer(1));

    let cleaned = engine
        .execute(Command::Clean {
            key: b"ch".to_vec(),
            leadership_id: "tok1".to_string(),
        })
        .unwrap();
    assert_eq!(cleaned, Reply::Integer(1));

    let ttl = engine.execute(Command::Ttl { key: b"ch".to_vec() }).unwrap();
    assert_eq!(ttl, Reply::Integer(-2));
}

#[test]
fn test_records_use_node_and_leadership_fields() {
    let engine = Engine::new();

    engine.get_or_create(b"ch", 10_000, "A", "tok1").unwrap();

    assert_eq!(
        engine.table().hmget(b"ch", &[FIELD_NODE, FIELD_LEADERSHIP]),
        vec![Some("A".to_string()), Some("tok1".to_string())]
    );
}

#[test]
fn test_keys_are_independent() {
    let engine = Engine::new();

    engine.get_or_create(b"ch1", 10_000, "A", "tok1").unwrap();
    engine.get_or_create(b"ch2", 10_000, "B", "tok2").unwrap();

    assert_eq!(engine.clean(b"ch1", "tok1"), Reply::Integer(1));
    assert_eq!(engine.read(b"ch2"), pair("B", "tok2"));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_get_or_create_single_winner() {
    let engine = Arc::new(Engine::new());

    let mut handles = vec![];

    for i in 0..32 {
        let e = Arc::clone(&engine);
        let handle = thread::spawn(move || {
            e.get_or_create(b"ch", 10_000, &format!("node{}", i), &format!("tok{}", i))
                .unwrap()
        });
        handles.push(handle);
    }

    let replies: Vec<Reply> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(replies.iter().all(|r| *r == replies[0]));
    assert_eq!(engine.read(b"ch"), replies[0]);
}

// =============================================================================
// Reaper Tests
// =============================================================================

#[test]
fn test_reaper_evicts_expired_records() {
    let engine = Arc::new(Engine::new());
    let reaper = Reaper::start(Arc::clone(&engine), Duration::from_millis(10)).unwrap();

    engine.get_or_create(b"ch", 20, "A", "tok1").unwrap();
    assert_eq!(engine.stored_count(), 1);

    thread::sleep(Duration::from_millis(150));

    assert_eq!(engine.stored_count(), 0);
    reaper.stop();
}

#[test]
fn test_reaper_stops_on_drop() {
    let engine = Arc::new(Engine::new());

    {
        let _reaper = Reaper::start(Arc::clone(&engine), Duration::from_millis(10)).unwrap();
    }

    // Only the test holds the engine once the reaper thread has exited
    assert_eq!(Arc::strong_count(&engine), 1);
}
