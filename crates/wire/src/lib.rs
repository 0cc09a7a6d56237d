// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary protocol between queue clients and the daemon.
//!
//! Wire format: 1-byte opcode + opcode-specific body, all integers big-endian.
//! Exactly one request and one response per connection.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod status;
mod wire;

pub use request::Request;
pub use response::{IdWidth, ParseIdWidthError, Response};
pub use status::{Opcode, Status};
pub use wire::{read_request, read_response, write_request, write_response, ProtocolError};
