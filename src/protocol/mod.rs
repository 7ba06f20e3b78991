//! Protocol Module
//!
//! Defines the wire protocol between leadership clients and the store.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: PING           - Payload: empty
//! - 0x02: READ           - Payload: key
//! - 0x03: GET_OR_CREATE  - Payload: key + ttl_ms + node_id + leadership_id
//! - 0x04: REFRESH        - Payload: key + ttl_ms + leadership_id
//! - 0x05: CLEAN          - Payload: key + leadership_id
//! - 0x06: TTL            - Payload: key
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK    - Payload: bincode-encoded `Reply`
//! - 0x01: ERROR - Payload: UTF-8 message

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Reply, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, payload_len,
    read_command, read_response, write_command, write_response, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
