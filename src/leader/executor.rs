//! Atomic Procedure Executor
//!
//! The seam between the leadership manager and a concrete store. Each
//! `Procedure` must run indivisibly against its key; `read` is a plain read
//! with no such guarantee.

use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::engine::Engine;
use crate::error::{LeaderError, Result};
use crate::protocol::{Command, Reply};

/// The three compound operations the manager relies on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Procedure {
    /// Create `{n: node_id, l: leadership_id}` with `ttl` if the key is
    /// absent. Replies `[n, l]` of whatever is stored afterwards.
    GetOrCreate {
        ttl: Duration,
        node_id: String,
        leadership_id: String,
    },

    /// Reset the expiry to `ttl` iff `l == leadership_id`. Replies `1`/`0`.
    Refresh { ttl: Duration, leadership_id: String },

    /// Delete the key iff `l == leadership_id`. Replies the deleted count.
    Clean { leadership_id: String },
}

impl Procedure {
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::GetOrCreate { .. } => "get-or-create",
            Procedure::Refresh { .. } => "refresh",
            Procedure::Clean { .. } => "clean",
        }
    }

    /// Wire command running this procedure against `key`
    pub fn to_command(&self, key: &[u8]) -> Result<Command> {
        let command = match self {
            Procedure::GetOrCreate {
                ttl,
                node_id,
                leadership_id,
            } => Command::GetOrCreate {
                key: key.to_vec(),
                ttl_ms: ttl_millis(*ttl)?,
                node_id: node_id.clone(),
                leadership_id: leadership_id.clone(),
            },
            Procedure::Refresh { ttl, leadership_id } => Command::Refresh {
                key: key.to_vec(),
                ttl_ms: ttl_millis(*ttl)?,
                leadership_id: leadership_id.clone(),
            },
            Procedure::Clean { leadership_id } => Command::Clean {
                key: key.to_vec(),
                leadership_id: leadership_id.clone(),
            },
        };
        Ok(command)
    }
}

/// Lease TTL as whole milliseconds, the unit the store expects
pub(crate) fn ttl_millis(ttl: Duration) -> Result<u64> {
    u64::try_from(ttl.as_millis())
        .map_err(|_| LeaderError::Config(format!("lease ttl {:?} is out of range", ttl)))
}

/// Runs procedures against a store
///
/// Implementations must surface transport failures as errors and never turn
/// them into empty replies.
pub trait ProcedureExecutor: Send + Sync {
    /// Run `procedure` atomically against `key`
    fn execute(&self, ctx: &Context, key: &[u8], procedure: &Procedure) -> Result<Reply>;

    /// Read the `[node, leadership]` fields of `key`
    fn read(&self, ctx: &Context, key: &[u8]) -> Result<Reply>;
}

/// Executor over an in-process `Engine`
#[derive(Clone)]
pub struct LocalExecutor {
    engine: Arc<Engine>,
}

impl LocalExecutor {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}

impl ProcedureExecutor for LocalExecutor {
    fn execute(&self, ctx: &Context, key: &[u8], procedure: &Procedure) -> Result<Reply> {
        ctx.check()?;
        self.engine.execute(procedure.to_command(key)?)
    }

    fn read(&self, ctx: &Context, key: &[u8]) -> Result<Reply> {
        ctx.check()?;
        Ok(self.engine.read(key))
    }
}

impl<E: ProcedureExecutor + ?Sized> ProcedureExecutor for Arc<E> {
    fn execute(&self, ctx: &Context, key: &[u8], procedure: &Procedure) -> Result<Reply> {
        (**self).execute(ctx, key, procedure)
    }

    fn read(&self, ctx: &Context, key: &[u8]) -> Result<Reply> {
        (**self).read(ctx, key)
    }
}
