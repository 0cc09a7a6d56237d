// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opcode and status byte tables.

/// Request kind, the first byte a client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Submit = 1,
    Lease = 2,
    Ack = 3,
    Nack = 4,
    Length = 5,
    Ping = 6,
}

impl Opcode {
    pub const ALL: [Opcode; 6] =
        [Opcode::Submit, Opcode::Lease, Opcode::Ack, Opcode::Nack, Opcode::Length, Opcode::Ping];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            1 => Ok(Opcode::Submit),
            2 => Ok(Opcode::Lease),
            3 => Ok(Opcode::Ack),
            4 => Ok(Opcode::Nack),
            5 => Ok(Opcode::Length),
            6 => Ok(Opcode::Ping),
            other => Err(other),
        }
    }
}

tw_core::simple_display! {
    Opcode {
        Submit => "submit",
        Lease => "lease",
        Ack => "ack",
        Nack => "nack",
        Length => "length",
        Ping => "ping",
    }
}

/// First byte of every response except LENGTH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    /// Queue empty on LEASE, job unknown or not leased on ACK/NACK
    Failed = 1,
    InvalidOpcode = 2,
    /// Connection closed before an opcode arrived
    EmptyRequest = 3,
    PayloadTooLarge = 4,
    IdSpaceExhausted = 5,
    /// PING reply
    Pong = 69,
}

impl Status {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Failed),
            2 => Ok(Status::InvalidOpcode),
            3 => Ok(Status::EmptyRequest),
            4 => Ok(Status::PayloadTooLarge),
            5 => Ok(Status::IdSpaceExhausted),
            69 => Ok(Status::Pong),
            other => Err(other),
        }
    }
}

tw_core::simple_display! {
    Status {
        Ok => "ok",
        Failed => "failed",
        InvalidOpcode => "invalid opcode",
        EmptyRequest => "empty request",
        PayloadTooLarge => "payload too large",
        IdSpaceExhausted => "id space exhausted",
        Pong => "pong",
    }
}
