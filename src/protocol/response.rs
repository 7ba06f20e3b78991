//! Response definitions
//!
//! Represents responses to clients and the raw values they carry.

use serde::{Deserialize, Serialize};

use crate::error::{LeaderError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

/// Raw value produced by the store
///
/// Interpretation is left to the caller; the leadership manager maps these
/// into typed outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Nil,
    Integer(i64),
    Status(String),
    Array(Vec<Option<String>>),
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Encoded `Reply` for OK, error message for ERROR
    pub payload: Vec<u8>,
}

impl Response {
    /// Create an OK response carrying a reply
    pub fn ok(reply: &Reply) -> Result<Self> {
        Ok(Self {
            status: Status::Ok,
            payload: bincode::serialize(reply)?,
        })
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: message.as_bytes().to_vec(),
        }
    }

    /// Unpack the reply, turning an ERROR response into `StoreRejected`
    pub fn into_reply(self) -> Result<Reply> {
        match self.status {
            Status::Ok => Ok(bincode::deserialize(&self.payload)?),
            Status::Error => Err(LeaderError::StoreRejected(
                String::from_utf8_lossy(&self.payload).into_owned(),
            )),
        }
    }
}
