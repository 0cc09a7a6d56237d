// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;
use tw_core::JobQueue;

use crate::listener::{ListenCtx, Listener};
use crate::reaper;

use super::{Config, Daemon, LifecycleError};

/// Start the daemon: bind the listener, then spawn the accept loop and reaper.
///
/// Returns once the socket is bound, so callers may connect immediately.
pub async fn startup(config: Config) -> Result<Daemon, LifecycleError> {
    config.validate()?;

    let tcp = TcpListener::bind(&config.addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.addr.clone(), e))?;
    let local_addr = tcp.local_addr()?;

    let queue = Arc::new(JobQueue::new(config.queue.clone()));
    let cancel = CancellationToken::new();
    let tasks = TaskTracker::new();

    let ctx = Arc::new(ListenCtx {
        queue: Arc::clone(&queue),
        id_width: config.id_width,
        ipc_timeout: config.ipc_timeout,
        max_payload_bytes: config.queue.max_payload_bytes,
    });
    let listener = Listener::new(tcp, ctx, cancel.clone(), tasks.clone());
    tasks.spawn(listener.run());
    tasks.spawn(reaper::run(Arc::clone(&queue), config.reaper_interval, cancel.clone()));

    info!(
        addr = %local_addr,
        visibility_timeout_ms = config.queue.visibility_timeout.as_millis() as u64,
        reaper_interval_ms = config.reaper_interval.as_millis() as u64,
        id_width = %config.id_width,
        "Daemon listening"
    );

    Ok(Daemon { config, queue, local_addr, cancel, tasks, start_time: Instant::now() })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
