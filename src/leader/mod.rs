//! Leader Module
//!
//! Channel leadership election over the lease store.
//!
//! ## Channel State Machine
//! ```text
//!             acquire_or_inspect(n, t)
//!   Absent ─────────────────────────────▶ Held(n, t)
//!     ▲                                    │  acquire_or_inspect(n2, t2): unchanged
//!     │  release(t) / TTL elapses          │  refresh(t):  TTL extended, true
//!     └────────────────────────────────────┘  refresh(t2): unchanged, false
//!                                             release(t2): unchanged, false
//! ```
//!
//! All coordination happens inside the store. A `LeaderManager` holds no
//! locks and caches nothing; every call is one round-trip.

mod executor;
mod fake;
mod manager;
mod mapper;
mod namespace;

pub use executor::{LocalExecutor, Procedure, ProcedureExecutor};
pub use fake::{FakeCalls, FakeFailure, FakeLeaderManager};
pub use manager::StoreLeaderManager;
pub use mapper::{flag_from_reply, leader_from_reply, optional_leader_from_reply};
pub use namespace::KeyNamespace;

use std::fmt;

use crate::context::Context;
use crate::error::Result;

/// Current holder of a channel's lease
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaderInfo {
    pub node_id: String,

    /// Fencing token of the current leadership term
    pub leadership_id: String,
}

impl LeaderInfo {
    pub fn new(node_id: impl Into<String>, leadership_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            leadership_id: leadership_id.into(),
        }
    }

    /// True if `node_id` holds this term
    pub fn is_held_by(&self, node_id: &str) -> bool {
        self.node_id == node_id
    }
}

/// Opaque fencing token for one leadership term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeadershipId(String);

impl LeadershipId {
    /// A fresh random token (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for LeadershipId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LeadershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Manager of channel leadership
///
/// Semantics:
/// - At most one lease exists per channel; its token is fixed for the term.
/// - `refresh`/`release` succeed only for the current token. `Ok(false)`
///   means "you are no longer leader": stop leader-only work immediately.
/// - Store failures are returned unchanged; nothing is retried.
pub trait LeaderManager: Send + Sync {
    /// Become leader of `channel` if nobody is, otherwise learn who is.
    ///
    /// Returns the holder after the call. When a lease already exists the
    /// offered `leadership_id` is discarded.
    fn acquire_or_inspect(
        &self,
        ctx: &Context,
        channel: &str,
        node_id: &str,
        leadership_id: &str,
    ) -> Result<LeaderInfo>;

    /// Snapshot of the current holder; `None` when the channel has no leader.
    fn inspect(&self, ctx: &Context, channel: &str) -> Result<Option<LeaderInfo>>;

    /// Extend the lease if `leadership_id` is still the current token.
    fn refresh(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool>;

    /// Delete the lease if `leadership_id` is still the current token.
    fn release(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool>;
}

impl<M: LeaderManager + ?Sized> LeaderManager for std::sync::Arc<M> {
    fn acquire_or_inspect(
        &self,
        ctx: &Context,
        channel: &str,
        node_id: &str,
        leadership_id: &str,
    ) -> Result<LeaderInfo> {
        (**self).acquire_or_inspect(ctx, channel, node_id, leadership_id)
    }

    fn inspect(&self, ctx: &Context, channel: &str) -> Result<Option<LeaderInfo>> {
        (**self).inspect(ctx, channel)
    }

    fn refresh(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool> {
        (**self).refresh(ctx, channel, leadership_id)
    }

    fn release(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool> {
        (**self).release(ctx, channel, leadership_id)
    }
}
