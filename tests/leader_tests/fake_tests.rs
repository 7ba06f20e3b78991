//! Tests for FakeLeaderManager
//!
//! The fake must follow the same state machine as the store-backed manager,
//! so code tested against it behaves the same in production.

use std::sync::Arc;

use chanlease::leader::{FakeCalls, FakeFailure};
use chanlease::{Context, FakeLeaderManager, LeaderError, LeaderInfo, LeaderManager};

fn ctx() -> Context {
    Context::background()
}

#[test]
fn test_fake_news_channel_scenario() {
    let fake = FakeLeaderManager::new();

    assert_eq!(
        fake.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap(),
        LeaderInfo::new("A", "tok1")
    );
    assert_eq!(
        fake.acquire_or_inspect(&ctx(), "news", "B", "tok2").unwrap(),
        LeaderInfo::new("A", "tok1")
    );
    assert!(fake.refresh(&ctx(), "news", "tok1").unwrap());
    assert!(!fake.refresh(&ctx(), "news", "tok2").unwrap());
    assert!(fake.release(&ctx(), "news", "tok1").unwrap());
    assert_eq!(fake.inspect(&ctx(), "news").unwrap(), None);
}

#[test]
fn test_fake_fenced_release_keeps_lease() {
    let fake = FakeLeaderManager::new();
    fake.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap();

    assert!(!fake.release(&ctx(), "news", "tok2").unwrap());
    assert_eq!(fake.leader("news"), Some(LeaderInfo::new("A", "tok1")));
}

#[test]
fn test_fake_expire_simulates_lapsed_lease() {
    let fake = FakeLeaderManager::new();
    fake.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap();

    assert!(fake.expire("news"));
    assert!(!fake.expire("news"));

    assert!(!fake.refresh(&ctx(), "news", "tok1").unwrap());
    assert_eq!(
        fake.acquire_or_inspect(&ctx(), "news", "B", "tok2").unwrap(),
        LeaderInfo::new("B", "tok2")
    );
}

#[test]
fn test_fake_set_leader_seeds_state() {
    let fake = FakeLeaderManager::new();
    fake.set_leader("news", LeaderInfo::new("Z", "tokz"));

    assert_eq!(
        fake.inspect(&ctx(), "news").unwrap(),
        Some(LeaderInfo::new("Z", "tokz"))
    );
}

#[test]
fn test_fake_injected_failures_are_consumed_in_order() {
    let fake = FakeLeaderManager::new();
    fake.fail_next(FakeFailure::StoreUnavailable);
    fake.fail_next(FakeFailure::MalformedResult);

    let first = fake.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap_err();
    assert!(first.is_store_unavailable());

    let second = fake.inspect(&ctx(), "news").unwrap_err();
    assert!(matches!(second, LeaderError::MalformedResult(_)));

    // Failed calls mutate nothing
    assert_eq!(fake.inspect(&ctx(), "news").unwrap(), None);
}

#[test]
fn test_fake_deadline_failure() {
    let fake = FakeLeaderManager::new();
    fake.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap();
    fake.fail_next(FakeFailure::DeadlineExceeded);

    assert!(matches!(
        fake.refresh(&ctx(), "news", "tok1"),
        Err(LeaderError::DeadlineExceeded)
    ));
    assert!(fake.refresh(&ctx(), "news", "tok1").unwrap());
}

#[test]
fn test_fake_honors_cancelled_context() {
    let fake = FakeLeaderManager::new();
    let ctx = Context::background();
    ctx.cancel_handle().cancel();

    assert!(matches!(
        fake.acquire_or_inspect(&ctx, "news", "A", "tok1"),
        Err(LeaderError::Cancelled)
    ));
    assert_eq!(fake.leader("news"), None);
}

#[test]
fn test_fake_counts_calls() {
    let fake = FakeLeaderManager::new();

    fake.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap();
    fake.inspect(&ctx(), "news").unwrap();
    fake.inspect(&ctx(), "news").unwrap();
    fake.refresh(&ctx(), "news", "tok1").unwrap();
    fake.fail_next(FakeFailure::StoreUnavailable);
    let _ = fake.release(&ctx(), "news", "tok1");

    assert_eq!(
        fake.calls(),
        FakeCalls {
            acquire: 1,
            inspect: 2,
            refresh: 1,
            release: 1,
        }
    );
}

#[test]
fn test_fake_usable_as_trait_object() {
    let manager: Arc<dyn LeaderManager> = Arc::new(FakeLeaderManager::new());

    let leader = manager.acquire_or_inspect(&ctx(), "news", "A", "tok1").unwrap();

    assert!(leader.is_held_by("A"));
    assert!(manager.release(&ctx(), "news", "tok1").unwrap());
}
