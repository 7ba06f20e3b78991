//! Engine Module
//!
//! The lease store: runs the pre-registered atomic procedures against the
//! record table.
//!
//! ## Responsibilities
//! - Route commands to their procedure
//! - Run each procedure as a single exclusive transaction
//! - Serve plain (non-atomic) reads under a shared lock

use std::time::{Duration, Instant};

use crate::error::{LeaderError, Result};
use crate::protocol::{Command, Reply};
use crate::table::LeaseTable;

/// Record field holding the leader's node ID
pub const FIELD_NODE: &str = "n";

/// Record field holding the leadership (fencing) token
pub const FIELD_LEADERSHIP: &str = "l";

/// The lease store
///
/// ## Concurrency Model
///
/// - **Procedures** (get-or-create/refresh/clean): each runs inside one
///   `LeaseTable::transaction`, holding the table's write lock from the
///   first read to the last write. No other procedure or read interleaves.
///
/// - **Reads** (read/ttl): share the read lock; a read sees the state either
///   before or after any procedure, never in between.
pub struct Engine {
    table: LeaseTable,
}

impl Engine {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            table: LeaseTable::new(),
        }
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Ping => Ok(Reply::Status("PONG".to_string())),
            Command::Read { key } => Ok(self.read(&key)),
            Command::GetOrCreate {
                key,
                ttl_ms,
                node_id,
                leadership_id,
            } => self.get_or_create(&key, ttl_ms, &node_id, &leadership_id),
            Command::Refresh {
                key,
                ttl_ms,
                leadership_id,
            } => self.refresh(&key, ttl_ms, &leadership_id),
            Command::Clean { key, leadership_id } => Ok(self.clean(&key, &leadership_id)),
            Command::Ttl { key } => Ok(self.ttl(&key)),
        }
    }

    /// Return the record's `[node, leadership]`, creating it first if absent
    ///
    /// Steps (one transaction):
    /// 1. If the key exists, return its fields unchanged
    /// 2. Otherwise write both fields and set the expiry
    /// 3. Return the fields as stored
    pub fn get_or_create(
        &self,
        key: &[u8],
        ttl_ms: u64,
        node_id: &str,
        leadership_id: &str,
    ) -> Result<Reply> {
        let ttl = Self::ttl_duration(ttl_ms)?;

        let fields = self.table.transaction(|txn| {
            if txn.exists(key) {
                return txn.hmget(key, &[FIELD_NODE, FIELD_LEADERSHIP]);
            }
            txn.hset(key, &[(FIELD_NODE, node_id), (FIELD_LEADERSHIP, leadership_id)]);
            txn.expire(key, ttl);
            vec![Some(node_id.to_string()), Some(leadership_id.to_string())]
        });

        Ok(Reply::Array(fields))
    }

    /// Extend the record's expiry iff its leadership field equals the token
    ///
    /// Returns `1` when extended, `0` otherwise (absent, expired, or fenced).
    pub fn refresh(&self, key: &[u8], ttl_ms: u64, leadership_id: &str) -> Result<Reply> {
        let ttl = Self::ttl_duration(ttl_ms)?;

        let renewed = self.table.transaction(|txn| {
            if !txn.exists(key) {
                return false;
            }
            if txn.hget(key, FIELD_LEADERSHIP).as_deref() != Some(leadership_id) {
                return false;
            }
            txn.expire(key, ttl)
        });

        Ok(Reply::Integer(i64::from(renewed)))
    }

    /// Delete the record iff its leadership field equals the token
    ///
    /// Returns the number of keys deleted.
    pub fn clean(&self, key: &[u8], leadership_id: &str) -> Reply {
        let deleted = self.table.transaction(|txn| {
            if txn.hget(key, FIELD_LEADERSHIP).as_deref() == Some(leadership_id) {
                txn.del(key)
            } else {
                false
            }
        });

        Reply::Integer(i64::from(deleted))
    }

    /// Plain read of `[node, leadership]`; both nil when absent
    pub fn read(&self, key: &[u8]) -> Reply {
        Reply::Array(self.table.hmget(key, &[FIELD_NODE, FIELD_LEADERSHIP]))
    }

    /// Remaining lifetime in milliseconds; `-2` if absent, `-1` if no expiry
    pub fn ttl(&self, key: &[u8]) -> Reply {
        match self.table.ttl(key) {
            None => Reply::Integer(-2),
            Some(None) => Reply::Integer(-1),
            Some(Some(left)) => Reply::Integer(left.as_millis() as i64),
        }
    }

    /// Evict expired records (called by the reaper)
    pub fn purge_expired(&self) -> usize {
        self.table.purge_expired()
    }

    fn ttl_duration(ttl_ms: u64) -> Result<Duration> {
        if ttl_ms == 0 {
            return Err(LeaderError::StoreRejected(
                "invalid expire time: ttl must be positive".to_string(),
            ));
        }
        let ttl = Duration::from_millis(ttl_ms);
        if Instant::now().checked_add(ttl).is_none() {
            return Err(LeaderError::StoreRejected(
                "invalid expire time: ttl out of range".to_string(),
            ));
        }
        Ok(ttl)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of live leases
    pub fn lease_count(&self) -> usize {
        self.table.len()
    }

    /// Number of stored records, including expired ones awaiting the reaper
    pub fn stored_count(&self) -> usize {
        self.table.raw_len()
    }

    /// Direct access to the table
    pub fn table(&self) -> &LeaseTable {
        &self.table
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
