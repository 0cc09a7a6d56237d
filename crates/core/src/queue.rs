// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The queue core: job store, ready queue, and lease table.
//!
//! All three live in one [`QueueState`] behind a single mutex. Every
//! operation that moves a job between the ready queue and the lease table
//! does so under that one lock, so a live job is always referenced by
//! exactly one of them. This is also what makes a reaper sweep and an ACK
//! racing on the same expiring lease resolve to exactly one winner.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::job::{Job, JobId, JobState, LeasedJob, Payload};

/// Default visibility timeout (30 seconds).
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum payload size (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Queue tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// How long a leased job stays invisible before it is eligible for redelivery
    pub visibility_timeout: Duration,
    /// Largest payload `submit` accepts
    pub max_payload_bytes: usize,
    /// Largest id `submit` may allocate. Lowered to `u32::MAX` when ids are
    /// reported to clients in 4 bytes.
    pub max_job_id: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_job_id: u64::MAX,
        }
    }
}

/// Errors from queue operations.
///
/// An empty ready queue is not an error: `lease` returns `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("payload of {len} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("job {0} is unknown or not leased")]
    UnknownOrNotLeased(JobId),

    #[error("job id space exhausted (limit {max})")]
    IdSpaceExhausted { max: u64 },
}

/// Point-in-time counts for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Jobs waiting in the ready queue
    pub ready: u64,
    /// Jobs currently held under a lease
    pub leased: u64,
    /// Id the next successful submit will receive (`None` once exhausted)
    pub next_id: Option<u64>,
}

struct QueueState {
    /// Job store: every live job, keyed by id
    jobs: HashMap<JobId, Job>,
    /// Ready queue, head is the next job to lease
    ready: VecDeque<JobId>,
    /// Lease table ordered by deadline so sweeps stop at the first live lease
    leases: BTreeSet<(Instant, JobId)>,
    /// `None` once the id counter has run past `u64::MAX`
    next_id: Option<u64>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            ready: VecDeque::new(),
            leases: BTreeSet::new(),
            next_id: Some(0),
        }
    }

    fn allocate_id(&mut self, max: u64) -> Result<JobId, QueueError> {
        let id = self
            .next_id
            .filter(|next| *next <= max)
            .ok_or(QueueError::IdSpaceExhausted { max })?;
        self.next_id = id.checked_add(1);
        Ok(JobId(id))
    }

    /// Move a leased job back to the ready queue tail.
    ///
    /// Returns false (and changes nothing) if the job is not leased.
    fn requeue(&mut self, id: JobId) -> bool {
        let Some(job) = self.jobs.get_mut(&id) else {
            return false;
        };
        let JobState::Leased { deadline } = job.state else {
            return false;
        };
        job.state = JobState::Ready;
        self.leases.remove(&(deadline, id));
        self.ready.push_back(id);
        true
    }
}

/// Thread-safe job queue with visibility-timeout leases.
pub struct JobQueue<C: Clock = SystemClock> {
    state: Mutex<QueueState>,
    config: QueueConfig,
    clock: C,
}

impl JobQueue<SystemClock> {
    pub fn new(config: QueueConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> JobQueue<C> {
    pub fn with_clock(config: QueueConfig, clock: C) -> Self {
        Self { state: Mutex::new(QueueState::new()), config, clock }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Add a job to the tail of the ready queue and return its id.
    ///
    /// Oversized payloads are rejected before an id is allocated.
    pub fn submit(&self, payload: impl Into<Payload>) -> Result<JobId, QueueError> {
        let payload = payload.into();
        if payload.len() > self.config.max_payload_bytes {
            return Err(QueueError::PayloadTooLarge {
                len: payload.len(),
                max: self.config.max_payload_bytes,
            });
        }

        let mut state = self.state.lock();
        let id = state.allocate_id(self.config.max_job_id)?;
        state.jobs.insert(id, Job::new(id, payload));
        state.ready.push_back(id);
        Ok(id)
    }

    /// Lease the job at the head of the ready queue.
    ///
    /// Returns `None` immediately when nothing is ready.
    pub fn lease(&self) -> Option<LeasedJob> {
        let deadline = self.clock.now() + self.config.visibility_timeout;
        let mut state = self.state.lock();
        let state = &mut *state;
        while let Some(id) = state.ready.pop_front() {
            let Some(job) = state.jobs.get_mut(&id) else {
                continue;
            };
            job.state = JobState::Leased { deadline };
            state.leases.insert((deadline, id));
            return Some(LeasedJob { id, payload: job.payload.clone(), deadline });
        }
        None
    }

    /// Acknowledge a leased job, removing it from the store for good.
    ///
    /// Returns the removed job in state [`JobState::Done`].
    pub fn ack(&self, id: JobId) -> Result<Job, QueueError> {
        let mut state = self.state.lock();
        let deadline = state
            .jobs
            .get(&id)
            .and_then(|job| job.state.lease_deadline())
            .ok_or(QueueError::UnknownOrNotLeased(id))?;
        state.leases.remove(&(deadline, id));
        let mut job = state.jobs.remove(&id).ok_or(QueueError::UnknownOrNotLeased(id))?;
        job.state = JobState::Done;
        Ok(job)
    }

    /// Give a leased job back before its deadline. It re-enters at the tail.
    pub fn release(&self, id: JobId) -> Result<(), QueueError> {
        if self.state.lock().requeue(id) {
            Ok(())
        } else {
            Err(QueueError::UnknownOrNotLeased(id))
        }
    }

    /// Number of jobs in the ready queue. Leased jobs are not counted.
    pub fn length(&self) -> u64 {
        self.state.lock().ready.len() as u64
    }

    /// Requeue every lease whose deadline is at or before `now`.
    ///
    /// Expired jobs go to the tail in deadline order. Returns their ids.
    pub fn sweep_expired(&self, now: Instant) -> Vec<JobId> {
        let mut state = self.state.lock();
        let mut requeued = Vec::new();
        while let Some(&(deadline, id)) = state.leases.first() {
            if deadline > now {
                break;
            }
            if state.requeue(id) {
                requeued.push(id);
            } else {
                // Stale index entry; the job is no longer leased
                state.leases.remove(&(deadline, id));
            }
        }
        requeued
    }

    /// Snapshot of queue counts.
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            ready: state.ready.len() as u64,
            leased: state.leases.len() as u64,
            next_id: state.next_id,
        }
    }

    /// Panics if the job store, ready queue, and lease table disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let state = self.state.lock();
        assert_eq!(state.jobs.len(), state.ready.len() + state.leases.len());
        for id in &state.ready {
            let job = &state.jobs[id];
            assert_eq!(job.state, JobState::Ready, "ready job {id} has state {}", job.state);
        }
        for (deadline, id) in &state.leases {
            let job = &state.jobs[id];
            assert_eq!(job.state, JobState::Leased { deadline: *deadline });
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
