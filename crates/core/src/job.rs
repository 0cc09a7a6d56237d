// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, payload, and lifecycle state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Unique identifier for a submitted job.
///
/// Allocated from a strictly increasing counter when the job is submitted and
/// never reused for the lifetime of the server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque job payload. Shared, never mutated after submission.
pub type Payload = Arc<[u8]>;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting in the ready queue
    Ready,
    /// Held by a consumer until `deadline`
    Leased { deadline: Instant },
    /// Acknowledged; the job no longer exists in the store
    Done,
}

impl JobState {
    pub fn lease_deadline(&self) -> Option<Instant> {
        match self {
            JobState::Leased { deadline } => Some(*deadline),
            _ => None,
        }
    }
}

crate::simple_display! {
    JobState {
        Ready => "ready",
        Leased { .. } => "leased",
        Done => "done",
    }
}

/// A job record as held by the job store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub payload: Payload,
    pub state: JobState,
}

impl Job {
    pub fn new(id: JobId, payload: Payload) -> Self {
        Self { id, payload, state: JobState::Ready }
    }
}

/// A job handed out by `lease()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeasedJob {
    pub id: JobId,
    pub payload: Payload,
    pub deadline: Instant,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
