// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background task that returns expired leases to the ready queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tw_core::{Clock, JobQueue};

/// Sweep expired leases every `interval` until `cancel` fires.
pub(crate) async fn run<C: Clock + 'static>(
    queue: Arc<JobQueue<C>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("reaper stopped");
                return;
            }
            _ = ticker.tick() => {
                sweep_once(&queue);
            }
        }
    }
}

/// One sweep at the queue clock's current time. Returns the number requeued.
pub(crate) fn sweep_once<C: Clock>(queue: &JobQueue<C>) -> usize {
    let requeued = queue.sweep_expired(queue.clock().now());
    if !requeued.is_empty() {
        let stats = queue.stats();
        info!(
            count = requeued.len(),
            ids = ?requeued,
            ready = stats.ready,
            leased = stats.leased,
            "requeued expired leases"
        );
    }
    requeued.len()
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
