//! Command definitions
//!
//! Represents commands from clients.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Ping = 0x01,
    Read = 0x02,
    GetOrCreate = 0x03,
    Refresh = 0x04,
    Clean = 0x05,
    Ttl = 0x06,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Ping),
            0x02 => Some(CommandType::Read),
            0x03 => Some(CommandType::GetOrCreate),
            0x04 => Some(CommandType::Refresh),
            0x05 => Some(CommandType::Clean),
            0x06 => Some(CommandType::Ttl),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ping (health check)
    Ping,

    /// Plain read of the leader fields of a key
    Read { key: Vec<u8> },

    /// Create the lease if absent, then return the current holder
    GetOrCreate {
        key: Vec<u8>,
        ttl_ms: u64,
        node_id: String,
        leadership_id: String,
    },

    /// Extend the lease iff the token matches
    Refresh {
        key: Vec<u8>,
        ttl_ms: u64,
        leadership_id: String,
    },

    /// Delete the lease iff the token matches
    Clean { key: Vec<u8>, leadership_id: String },

    /// Remaining lifetime of a key in milliseconds
    Ttl { key: Vec<u8> },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping => CommandType::Ping,
            Command::Read { .. } => CommandType::Read,
            Command::GetOrCreate { .. } => CommandType::GetOrCreate,
            Command::Refresh { .. } => CommandType::Refresh,
            Command::Clean { .. } => CommandType::Clean,
            Command::Ttl { .. } => CommandType::Ttl,
        }
    }

    /// The key this command addresses, if any
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Command::Ping => None,
            Command::Read { key }
            | Command::GetOrCreate { key, .. }
            | Command::Refresh { key, .. }
            | Command::Clean { key, .. }
            | Command::Ttl { key } => Some(key),
        }
    }
}
