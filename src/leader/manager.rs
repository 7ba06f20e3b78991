//! Store-backed leadership manager

use std::time::Duration;

use super::executor::ttl_millis;
use super::mapper::{flag_from_reply, leader_from_reply, optional_leader_from_reply};
use super::{KeyNamespace, LeaderInfo, LeaderManager, Procedure, ProcedureExecutor};
use crate::config::Config;
use crate::context::Context;
use crate::error::{LeaderError, Result};
use crate::protocol::Reply;

/// `LeaderManager` running its operations as store procedures
///
/// Holds only its executor, key namespace and TTL. Any number of managers,
/// in any number of processes, may share one store.
pub struct StoreLeaderManager<E> {
    executor: E,
    namespace: KeyNamespace,
    ttl: Duration,
}

impl<E: ProcedureExecutor> StoreLeaderManager<E> {
    /// Create a manager; `ttl` applies to creation and every refresh
    pub fn new(executor: E, prefix: impl Into<String>, ttl: Duration) -> Result<Self> {
        if ttl_millis(ttl)? == 0 {
            return Err(LeaderError::Config(
                "lease ttl must be at least 1ms".to_string(),
            ));
        }
        Ok(Self {
            executor,
            namespace: KeyNamespace::new(prefix),
            ttl,
        })
    }

    /// Create a manager from `config.key_prefix` and `config.lease_ttl`
    pub fn from_config(executor: E, config: &Config) -> Result<Self> {
        Self::new(executor, config.key_prefix.clone(), config.lease_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn namespace(&self) -> &KeyNamespace {
        &self.namespace
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn run(&self, ctx: &Context, channel: &str, procedure: Procedure) -> Result<Reply> {
        let key = self.namespace.key(channel);
        tracing::trace!(channel, procedure = procedure.name(), "Executing procedure");
        self.executor.execute(ctx, &key, &procedure)
    }
}

impl<E: ProcedureExecutor> LeaderManager for StoreLeaderManager<E> {
    fn acquire_or_inspect(
        &self,
        ctx: &Context,
        channel: &str,
        node_id: &str,
        leadership_id: &str,
    ) -> Result<LeaderInfo> {
        let reply = self.run(
            ctx,
            channel,
            Procedure::GetOrCreate {
                ttl: self.ttl,
                node_id: node_id.to_string(),
                leadership_id: leadership_id.to_string(),
            },
        )?;

        let leader = leader_from_reply(reply).map_err(|e| log_malformed(channel, e))?;
        let won = leader.leadership_id == leadership_id;
        tracing::debug!(
            channel,
            candidate = node_id,
            leader = %leader.node_id,
            won,
            "Acquire or inspect"
        );
        Ok(leader)
    }

    fn inspect(&self, ctx: &Context, channel: &str) -> Result<Option<LeaderInfo>> {
        let key = self.namespace.key(channel);
        let reply = self.executor.read(ctx, &key)?;
        optional_leader_from_reply(reply).map_err(|e| log_malformed(channel, e))
    }

    fn refresh(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool> {
        let reply = self.run(
            ctx,
            channel,
            Procedure::Refresh {
                ttl: self.ttl,
                leadership_id: leadership_id.to_string(),
            },
        )?;

        let renewed = flag_from_reply(reply).map_err(|e| log_malformed(channel, e))?;
        if !renewed {
            tracing::debug!(channel, "Refresh rejected, leadership lost");
        }
        Ok(renewed)
    }

    fn release(&self, ctx: &Context, channel: &str, leadership_id: &str) -> Result<bool> {
        let reply = self.run(
            ctx,
            channel,
            Procedure::Clean {
                leadership_id: leadership_id.to_string(),
            },
        )?;

        let released = flag_from_reply(reply).map_err(|e| log_malformed(channel, e))?;
        tracing::debug!(channel, released, "Release");
        Ok(released)
    }
}

fn log_malformed(channel: &str, err: LeaderError) -> LeaderError {
    tracing::error!(channel, error = %err, "Store reply does not match procedure contract");
    err
}
