//! Key Namespacer
//!
//! Maps channel names to store keys.

/// Derives store keys as `prefix + channel`
///
/// Managers with different prefixes never see each other's leases, even
/// when they share a store and use the same channel names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyNamespace {
    prefix: String,
}

impl KeyNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Store key for `channel`
    pub fn key(&self, channel: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len() + channel.len());
        key.extend_from_slice(self.prefix.as_bytes());
        key.extend_from_slice(channel.as_bytes());
        key
    }
}
