//! Configuration for chanlease
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{LeaderError, Result};

/// Default lifetime of a lease, applied on creation and on every refresh.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10);

/// Main configuration shared by the store server and leadership clients
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Leadership Configuration
    // -------------------------------------------------------------------------
    /// Prepended to every channel name to form its store key.
    /// Independent leadership domains sharing one store use distinct prefixes.
    pub key_prefix: String,

    /// Lease lifetime; an unrefreshed lease is removed by the store after this.
    pub lease_ttl: Duration,

    // -------------------------------------------------------------------------
    // Store Server Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Idle read timeout per connection (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Write timeout per connection (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// How often the reaper evicts expired leases (milliseconds)
    pub sweep_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// Address of the store server
    pub store_addr: String,

    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Per-call I/O timeout used when the caller's context has no deadline
    /// (milliseconds)
    pub io_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            lease_ttl: DEFAULT_LEASE_TTL,
            listen_addr: "127.0.0.1:7420".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            sweep_interval_ms: 100,
            store_addr: "127.0.0.1:7420".to_string(),
            connect_timeout_ms: 1000,
            io_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the store cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.lease_ttl.as_millis() == 0 {
            return Err(LeaderError::Config(
                "lease_ttl must be at least 1ms".to_string(),
            ));
        }
        if u64::try_from(self.lease_ttl.as_millis()).is_err() {
            return Err(LeaderError::Config(
                "lease_ttl does not fit in u64 milliseconds".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(LeaderError::Config(
                "max_connections must be positive".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(LeaderError::Config(
                "sweep_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the channel key prefix
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set the lease TTL
    pub fn lease_ttl(mut self, ttl: Duration) -> Self {
        self.config.lease_ttl = ttl;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the reaper sweep interval (in milliseconds)
    pub fn sweep_interval_ms(mut self, ms: u64) -> Self {
        self.config.sweep_interval_ms = ms;
        self
    }

    /// Set the store server address used by clients
    pub fn store_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.store_addr = addr.into();
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the fallback per-call I/O timeout (in milliseconds)
    pub fn io_timeout_ms(mut self, ms: u64) -> Self {
        self.config.io_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
