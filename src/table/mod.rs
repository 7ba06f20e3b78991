//! Table Module
//!
//! In-memory keyed records with per-key expiry.
//!
//! ## Responsibilities
//! - Multi-field record storage per key
//! - Per-key time-to-live, enforced on every access
//! - Exclusive transactions so compound read/check/write sequences are atomic
//!
//! ## Data Structure Choice
//! HashMap wrapped in RwLock:
//! - Plain reads share the lock, transactions take it exclusively
//! - No ordering requirement (nothing is ever range-scanned)

mod lease_table;

pub use lease_table::{LeaseTable, Txn};

use std::collections::BTreeMap;
use std::time::Instant;

/// A stored record: named fields plus an optional expiry instant
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub fields: BTreeMap<String, String>,

    /// `None` means the record never expires
    pub expires_at: Option<Instant>,
}

impl Record {
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}
