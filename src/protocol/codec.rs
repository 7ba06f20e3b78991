//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! Strings are `len (4) + bytes`, integers are 8 bytes big-endian.
//! - PING:          empty
//! - READ:          key
//! - GET_OR_CREATE: key + ttl_ms + node_id + leadership_id
//! - REFRESH:       key + ttl_ms + leadership_id
//! - CLEAN:         key + leadership_id
//! - TTL:           key
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Command, CommandType, Response, Status};
use crate::error::{LeaderError, Result};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (1 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match command {
        Command::Ping => {}
        Command::Read { key } | Command::Ttl { key } => {
            put_bytes(&mut payload, key);
        }
        Command::GetOrCreate {
            key,
            ttl_ms,
            node_id,
            leadership_id,
        } => {
            put_bytes(&mut payload, key);
            payload.put_u64(*ttl_ms);
            put_bytes(&mut payload, node_id.as_bytes());
            put_bytes(&mut payload, leadership_id.as_bytes());
        }
        Command::Refresh {
            key,
            ttl_ms,
            leadership_id,
        } => {
            put_bytes(&mut payload, key);
            payload.put_u64(*ttl_ms);
            put_bytes(&mut payload, leadership_id.as_bytes());
        }
        Command::Clean { key, leadership_id } => {
            put_bytes(&mut payload, key);
            put_bytes(&mut payload, leadership_id.as_bytes());
        }
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, mut payload) = split_frame(bytes, "command")?;

    let cmd_type = CommandType::from_byte(cmd_type).ok_or_else(|| {
        LeaderError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_type))
    })?;

    let buf = &mut payload;
    let command = match cmd_type {
        CommandType::Ping => Command::Ping,
        CommandType::Read => Command::Read {
            key: get_bytes(buf, "READ key")?,
        },
        CommandType::GetOrCreate => Command::GetOrCreate {
            key: get_bytes(buf, "GET_OR_CREATE key")?,
            ttl_ms: get_u64(buf, "GET_OR_CREATE ttl")?,
            node_id: get_string(buf, "GET_OR_CREATE node id")?,
            leadership_id: get_string(buf, "GET_OR_CREATE leadership id")?,
        },
        CommandType::Refresh => Command::Refresh {
            key: get_bytes(buf, "REFRESH key")?,
            ttl_ms: get_u64(buf, "REFRESH ttl")?,
            leadership_id: get_string(buf, "REFRESH leadership id")?,
        },
        CommandType::Clean => Command::Clean {
            key: get_bytes(buf, "CLEAN key")?,
            leadership_id: get_string(buf, "CLEAN leadership id")?,
        },
        CommandType::Ttl => Command::Ttl {
            key: get_bytes(buf, "TTL key")?,
        },
    };

    if buf.has_remaining() {
        return Err(LeaderError::Protocol(format!(
            "{:?} command: unexpected {} trailing bytes",
            cmd_type,
            buf.remaining()
        )));
    }

    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(response.status as u8, &response.payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::Error,
        _ => {
            return Err(LeaderError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    Ok(Response {
        status,
        payload: payload.to_vec(),
    })
}

/// Parse the payload length out of a frame header
pub fn payload_len(header: &[u8; HEADER_SIZE]) -> Result<usize> {
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if len > MAX_PAYLOAD_SIZE {
        return Err(LeaderError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(LeaderError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&bytes[..HEADER_SIZE]);
    let len = payload_len(&header)?;

    let total_len = HEADER_SIZE + len;
    if bytes.len() < total_len {
        return Err(LeaderError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let len = payload_len(&header)?;

    let mut message = vec![0u8; HEADER_SIZE + len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

fn put_bytes(buf: &mut BytesMut, value: &[u8]) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value);
}

fn get_u64(buf: &mut &[u8], what: &str) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(LeaderError::Protocol(format!("{}: missing", what)));
    }
    Ok(buf.get_u64())
}

fn get_bytes(buf: &mut &[u8], what: &str) -> Result<Vec<u8>> {
    if buf.remaining() < 4 {
        return Err(LeaderError::Protocol(format!("{}: missing length", what)));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(LeaderError::Protocol(format!(
            "{}: incomplete (expected {}, got {})",
            what,
            len,
            buf.remaining()
        )));
    }
    let value = buf[..len].to_vec();
    buf.advance(len);
    Ok(value)
}

fn get_string(buf: &mut &[u8], what: &str) -> Result<String> {
    let bytes = get_bytes(buf, what)?;
    String::from_utf8(bytes)
        .map_err(|_| LeaderError::Protocol(format!("{}: not valid UTF-8", what)))
}
