// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tw-core: job model and the in-memory lease queue behind the taxiway daemon

pub mod macros;

pub mod clock;
pub mod job;
pub mod queue;

pub use clock::{Clock, FakeClock, SystemClock};
pub use job::{Job, JobId, JobState, LeasedJob, Payload};
pub use queue::{
    JobQueue, QueueConfig, QueueError, QueueStats, DEFAULT_MAX_PAYLOAD_BYTES,
    DEFAULT_VISIBILITY_TIMEOUT,
};
