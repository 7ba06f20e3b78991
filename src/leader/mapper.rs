//! Result mapping
//!
//! Turns raw store replies into typed outcomes. Any reply whose shape does
//! not match the procedure's contract is a `MalformedResult`, never a
//! silently coerced value.

use super::LeaderInfo;
use crate::error::{LeaderError, Result};
use crate::protocol::Reply;

/// `[node, leadership]` with both present
pub fn leader_from_reply(reply: Reply) -> Result<LeaderInfo> {
    match reply {
        Reply::Array(fields) if fields.len() == 2 => {
            let mut fields = fields.into_iter();
            match (fields.next().flatten(), fields.next().flatten()) {
                (Some(node_id), Some(leadership_id)) => Ok(LeaderInfo {
                    node_id,
                    leadership_id,
                }),
                _ => Err(LeaderError::MalformedResult(
                    "expected node and leadership, got nil".to_string(),
                )),
            }
        }
        other => Err(unexpected("2-element array", &other)),
    }
}

/// `[node, leadership]`, or `[nil, nil]` when there is no leader
pub fn optional_leader_from_reply(reply: Reply) -> Result<Option<LeaderInfo>> {
    match reply {
        Reply::Array(fields) if fields.len() == 2 => {
            let mut fields = fields.into_iter();
            match (fields.next().flatten(), fields.next().flatten()) {
                (None, _) => Ok(None),
                (Some(node_id), Some(leadership_id)) => Ok(Some(LeaderInfo {
                    node_id,
                    leadership_id,
                })),
                (Some(node_id), None) => Err(LeaderError::MalformedResult(format!(
                    "leader {} has no leadership id",
                    node_id
                ))),
            }
        }
        other => Err(unexpected("2-element array", &other)),
    }
}

/// Integer reply as a success flag: `0` is false, positive is true
pub fn flag_from_reply(reply: Reply) -> Result<bool> {
    match reply {
        Reply::Integer(0) => Ok(false),
        Reply::Integer(n) if n > 0 => Ok(true),
        other => Err(unexpected("non-negative integer", &other)),
    }
}

fn unexpected(expected: &str, got: &Reply) -> LeaderError {
    LeaderError::MalformedResult(format!("expected {}, got {:?}", expected, got))
}
