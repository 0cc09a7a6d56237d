// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Taxiway daemon library
//!
//! Serves the job queue over TCP. The `twd` binary is a thin wrapper around
//! [`lifecycle::startup`]; integration tests start daemons in-process the same way.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
mod listener;
mod reaper;
pub mod shutdown;

pub use lifecycle::{startup, Config, Daemon, LifecycleError};
