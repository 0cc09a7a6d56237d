// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client requests.

use tw_core::JobId;

use crate::Opcode;

/// A decoded request.
///
/// Request bodies:
/// - SUBMIT: `u32` payload length + payload bytes
/// - ACK, NACK: `u64` job id
/// - LEASE, LENGTH, PING: empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Submit { payload: Vec<u8> },
    Lease,
    Ack { id: JobId },
    Nack { id: JobId },
    Length,
    Ping,
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::Submit { .. } => Opcode::Submit,
            Request::Lease => Opcode::Lease,
            Request::Ack { .. } => Opcode::Ack,
            Request::Nack { .. } => Opcode::Nack,
            Request::Length => Opcode::Length,
            Request::Ping => Opcode::Ping,
        }
    }

    /// Encode into wire bytes.
    ///
    /// Returns `None` if a SUBMIT payload does not fit a `u32` length prefix.
    pub fn encode(&self) -> Option<Vec<u8>> {
        let mut buf = vec![self.opcode().as_u8()];
        match self {
            Request::Submit { payload } => {
                let len = u32::try_from(payload.len()).ok()?;
                buf.reserve(4 + payload.len());
                buf.extend_from_slice(&len.to_be_bytes());
                buf.extend_from_slice(payload);
            }
            Request::Ack { id } | Request::Nack { id } => {
                buf.extend_from_slice(&id.as_u64().to_be_bytes());
            }
            Request::Lease | Request::Length | Request::Ping => {}
        }
        Some(buf)
    }
}
