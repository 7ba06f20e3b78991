//! Hand-written fake of `LeaderManager` for tests of leader-driven code
//!
//! Follows the same channel state machine as the store-backed manager but
//! keeps leases in a map. TTL never elapses on its own; call `expire` to
//! simulate a lapsed lease.

use std::collections::{HashMap, VecDeque};
use std::io;

use parking_lot::Mutex;

use super::{LeaderInfo, LeaderManager};
use crate::context::Context;
use crate::error::{LeaderError, Result};

/// Failure to inject into the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    StoreUnavailable,
    MalformedResult,
    DeadlineExceeded,
}

impl FakeFailure {
    fn into_error(self) -> LeaderError {
        match self {
            FakeFailure::StoreUnavailable => LeaderError::StoreUnavailable(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "fake store unavailable",
            )),
            FakeFailure::MalformedResult => {
                LeaderError::MalformedResult("fake malformed result".to_string())
            }
            FakeFailure::DeadlineExceeded => LeaderError::DeadlineExceeded,
        }
    }
}

/// Number of calls per operation, failed ones included
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FakeCalls {
    pub acquire: usize,
    pub inspect: usize,
    pub refresh: usize,
    pub release: usize,
}

#[derive(Default)]
struct FakeState {
    leases: HashMap<String, LeaderInfo>,
    failures: VecDeque<FakeFailure>,
    calls: FakeCalls,
}

#[derive(Default)]
pub struct FakeLeaderManager {
    state: Mutex<FakeState>,
}

impl FakeLeaderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call (of any operation) fail. Queued failures are
    /// consumed one per call, in order.
    pub fn fail_next(&self, failure: FakeFailure) {
        self.state.lock().failures.push_back(failure);
    }

    /// Drop the lease as if its TTL elapsed. Returns false if there was none.
    pub fn expire(&self, channel: &str) -> bool {
        self.state.lock().leases.remove(channel).is_some()
    }

    /// Install a leader directly, replacing any current one
    pub fn set_leader(&self, channel: &str, leader: LeaderInfo) {
        self.state.lock().leases.insert(channel.to_string(), leader);
    }

    pub fn leader(&self, channel: &str) -> Option<LeaderInfo> {
        self.state.lock().leases.get(channel).cloned()
    }

    pub fn calls(&self) -> FakeCalls {
        self.state.lock().calls
    }

    fn begin(state: &mut FakeState, ctx: &Context) -> Result<()> {
        ctx.check()?;
        match state.failures.pop_front() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

impl LeaderManager for FakeLeaderManager {
    fn acquire_or_inspect(
        &self,
        ctx: &Context,
        channel: &str,
        node_id: &str,
        leadership_id: &str,
    ) -> Result<LeaderInfo> {
        let mut state = self.state.lock();
        state.calls.acquire += 1;
        Self::begin(&mut state, ctx)?;

        let leader = state
            .leases
            .entry(channel.to_string())
            .or_insert_with(|| LeaderInfo::new(node_id, leadership_id));
        Ok(leader.clone())
    }

    fn inspect(&self, ctx: &Context, channel: &str) -> Result<Option<LeaderInfo>> {
        let mut state = self.state.lock();
        state.calls.inspect += 1;
        Self::begin(&mut state, ctx)?;

        Ok(state.leases.get(channel).cloned())
    }

    fn refresh(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls.refresh += 1;
        Self::begin(&mut state, ctx)?;

        Ok(matches!(
            state.leases.get(channel),
            Some(leader) if leader.leadership_id == leadership_id
        ))
    }

    fn release(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool> {
        let mut state = self.state.lock();
        state.calls.release += 1;
        Self::begin(&mut state, ctx)?;

        let matches = matches!(
            state.leases.get(channel),
            Some(leader) if leader.leadership_id == leadership_id
        );
        if matches {
            state.leases.remove(channel);
        }
        Ok(matches)
    }
}
