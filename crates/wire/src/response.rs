// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server responses.

use std::str::FromStr;

use thiserror::Error;
use tw_core::{JobId, Payload};

use crate::{ProtocolError, Status};

/// Width of the job id in a SUBMIT response.
///
/// LEASE responses always carry 8-byte ids; ACK and NACK requests always
/// send 8. `Narrow` keeps SUBMIT compatible with clients that read a 4-byte
/// id, which caps the id space at `u32::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdWidth {
    #[default]
    Narrow,
    Wide,
}

impl IdWidth {
    pub fn bytes(self) -> usize {
        match self {
            IdWidth::Narrow => 4,
            IdWidth::Wide => 8,
        }
    }

    /// Largest id representable at this width.
    pub fn max_id(self) -> u64 {
        match self {
            IdWidth::Narrow => u64::from(u32::MAX),
            IdWidth::Wide => u64::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("id width must be 4 or 8, got {0:?}")]
pub struct ParseIdWidthError(pub String);

impl FromStr for IdWidth {
    type Err = ParseIdWidthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "4" => Ok(IdWidth::Narrow),
            "8" => Ok(IdWidth::Wide),
            other => Err(ParseIdWidthError(other.to_string())),
        }
    }
}

tw_core::simple_display! {
    IdWidth {
        Narrow => "4",
        Wide => "8",
    }
}

/// A response to exactly one request.
///
/// Response bodies:
/// - SUBMIT: status `0` + job id (`IdWidth` bytes)
/// - LEASE: status `0` + `u64` id + `u32` payload length + payload, or status `1`
/// - ACK, NACK: status `0` or `1`
/// - LENGTH: bare `u64`, no status byte
/// - PING: status `69`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Submitted { id: JobId },
    Leased { id: JobId, payload: Payload },
    QueueEmpty,
    /// ACK or NACK applied
    Ok,
    /// ACK or NACK on a job that is unknown or not leased
    Failed,
    Length(u64),
    Pong,
    /// Request rejected before reaching the queue
    Error(Status),
}

impl Response {
    pub fn encode(&self, width: IdWidth) -> Result<Vec<u8>, ProtocolError> {
        let buf = match self {
            Response::Submitted { id } => {
                let raw = id.as_u64();
                if raw > width.max_id() {
                    return Err(ProtocolError::IdOutOfRange { id: *id, width });
                }
                let mut buf = vec![Status::Ok.as_u8()];
                match width {
                    IdWidth::Narrow => buf.extend_from_slice(&(raw as u32).to_be_bytes()),
                    IdWidth::Wide => buf.extend_from_slice(&raw.to_be_bytes()),
                }
                buf
            }
            Response::Leased { id, payload } => {
                let len = u32::try_from(payload.len()).map_err(|_| {
                    ProtocolError::PayloadTooLarge { len: payload.len(), max: u32::MAX as usize }
                })?;
                let mut buf = Vec::with_capacity(1 + 8 + 4 + payload.len());
                buf.push(Status::Ok.as_u8());
                buf.extend_from_slice(&id.as_u64().to_be_bytes());
                buf.extend_from_slice(&len.to_be_bytes());
                buf.extend_from_slice(payload);
                buf
            }
            Response::QueueEmpty | Response::Failed => vec![Status::Failed.as_u8()],
            Response::Ok => vec![Status::Ok.as_u8()],
            Response::Length(n) => n.to_be_bytes().to_vec(),
            Response::Pong => vec![Status::Pong.as_u8()],
            Response::Error(status) => vec![status.as_u8()],
        };
        Ok(buf)
    }
}
