//! LeaseTable implementation
//!
//! HashMap-based record table with RwLock for concurrency.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::Record;

/// Keyed records with lazy, access-time expiry
pub struct LeaseTable {
    data: RwLock<HashMap<Vec<u8>, Record>>,
}

impl LeaseTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Read several fields of a key (read lock)
    ///
    /// Returns one slot per requested field; all `None` when the key is
    /// absent or expired.
    pub fn hmget(&self, key: &[u8], fields: &[&str]) -> Vec<Option<String>> {
        let now = Instant::now();
        let data = self.data.read();
        match data.get(key) {
            Some(record) if !record.is_expired(now) => fields
                .iter()
                .map(|f| record.fields.get(*f).cloned())
                .collect(),
            _ => vec![None; fields.len()],
        }
    }

    /// Remaining lifetime of a key (read lock)
    ///
    /// `None` if absent, `Some(None)` if it never expires.
    pub fn ttl(&self, key: &[u8]) -> Option<Option<Duration>> {
        let now = Instant::now();
        let data = self.data.read();
        match data.get(key) {
            Some(record) if !record.is_expired(now) => {
                Some(record.expires_at.map(|at| at.saturating_duration_since(now)))
            }
            _ => None,
        }
    }

    /// Run `f` with exclusive access to the table (write lock)
    ///
    /// Nothing else reads or writes the table until `f` returns, so every
    /// step inside `f` observes and produces a single consistent state.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Txn<'_>) -> R) -> R {
        let mut data = self.data.write();
        let mut txn = Txn {
            data: &mut *data,
            now: Instant::now(),
        };
        f(&mut txn)
    }

    /// Physically remove every expired record, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|_, record| !record.is_expired(now));
        before - data.len()
    }

    /// Number of live (unexpired) records
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .values()
            .filter(|r| !r.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored records, including expired ones not yet purged
    pub fn raw_len(&self) -> usize {
        self.data.read().len()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

impl Default for LeaseTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive view of the table for one compound operation
///
/// The clock is read once when the transaction starts.
pub struct Txn<'a> {
    data: &'a mut HashMap<Vec<u8>, Record>,
    now: Instant,
}

impl Txn<'_> {
    fn evict_if_expired(&mut self, key: &[u8]) {
        if matches!(self.data.get(key), Some(r) if r.is_expired(self.now)) {
            self.data.remove(key);
        }
    }

    fn live(&mut self, key: &[u8]) -> Option<&mut Record> {
        self.evict_if_expired(key);
        self.data.get_mut(key)
    }

    pub fn exists(&mut self, key: &[u8]) -> bool {
        self.live(key).is_some()
    }

    pub fn hget(&mut self, key: &[u8], field: &str) -> Option<String> {
        self.live(key).and_then(|r| r.fields.get(field).cloned())
    }

    pub fn hmget(&mut self, key: &[u8], fields: &[&str]) -> Vec<Option<String>> {
        match self.live(key) {
            Some(record) => fields
                .iter()
                .map(|f| record.fields.get(*f).cloned())
                .collect(),
            None => vec![None; fields.len()],
        }
    }

    /// Set fields, creating a non-expiring record if the key is absent
    pub fn hset(&mut self, key: &[u8], pairs: &[(&str, &str)]) {
        self.evict_if_expired(key);
        let record = self.data.entry(key.to_vec()).or_default();
        for (field, value) in pairs {
            record.fields.insert((*field).to_string(), (*value).to_string());
        }
    }

    /// Set the key to expire `ttl` from the transaction's start.
    /// Returns false if the key does not exist or the expiry is unrepresentable.
    pub fn expire(&mut self, key: &[u8], ttl: Duration) -> bool {
        let Some(at) = self.now.checked_add(ttl) else {
            return false;
        };
        match self.live(key) {
            Some(record) => {
                record.expires_at = Some(at);
                true
            }
            None => false,
        }
    }

    /// Remove the key. Returns false if it did not exist.
    pub fn del(&mut self, key: &[u8]) -> bool {
        self.evict_if_expired(key);
        self.data.remove(key).is_some()
    }
}
