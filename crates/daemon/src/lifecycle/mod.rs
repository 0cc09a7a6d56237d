// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

mod startup;
pub use startup::startup;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use tw_core::{JobQueue, QueueConfig};
use tw_wire::IdWidth;

use crate::env;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to listen on (`host:port`)
    pub addr: String,
    /// Queue tuning; `max_job_id` follows `id_width`
    pub queue: QueueConfig,
    /// Width of the id in SUBMIT responses
    pub id_width: IdWidth,
    /// Period of the expired-lease sweep
    pub reaper_interval: Duration,
    /// Read/write timeout per connection
    pub ipc_timeout: Duration,
    /// How long shutdown waits for in-flight connections
    pub drain_timeout: Duration,
    /// Directory for the daemon log file (stderr when `None`)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `TW_*` environment variables.
    pub fn load() -> Result<Self, LifecycleError> {
        let id_width = env::submit_id_width()?;
        let config = Self {
            addr: env::addr(),
            queue: QueueConfig {
                visibility_timeout: env::visibility_timeout(),
                max_payload_bytes: env::max_payload_bytes(),
                max_job_id: id_width.max_id(),
            },
            id_width,
            reaper_interval: env::reaper_interval(),
            ipc_timeout: env::ipc_timeout(),
            drain_timeout: env::drain_timeout(),
            log_dir: env::log_dir(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults for a given listen address, ignoring the environment.
    pub fn with_addr(addr: impl Into<String>) -> Self {
        let id_width = IdWidth::default();
        Self {
            addr: addr.into(),
            queue: QueueConfig { max_job_id: id_width.max_id(), ..QueueConfig::default() },
            id_width,
            reaper_interval: Duration::from_secs(5),
            ipc_timeout: Duration::from_secs(5),
            drain_timeout: Duration::from_secs(5),
            log_dir: None,
        }
    }

    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.reaper_interval.is_zero() {
            return Err(LifecycleError::InvalidConfig(
                "reaper interval must be greater than zero".to_string(),
            ));
        }
        if self.ipc_timeout.is_zero() {
            return Err(LifecycleError::InvalidConfig(
                "ipc timeout must be greater than zero".to_string(),
            ));
        }
        if self.queue.max_job_id > self.id_width.max_id() {
            return Err(LifecycleError::InvalidConfig(format!(
                "max job id {} does not fit in {}-byte submit ids",
                self.queue.max_job_id, self.id_width
            )));
        }
        Ok(())
    }
}

/// A running daemon.
///
/// Owns the queue, the listener and reaper tasks, and the token that stops
/// them. Dropping it without calling [`Daemon::shutdown`] leaves the tasks
/// running until the tokio runtime exits.
pub struct Daemon {
    pub config: Config,
    queue: Arc<JobQueue>,
    local_addr: SocketAddr,
    cancel: CancellationToken,
    tasks: TaskTracker,
    start_time: Instant,
}

impl Daemon {
    /// Address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Token that stops the daemon when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait until something cancels the daemon's token.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Stop accepting connections and wait for in-flight ones to finish.
    ///
    /// Queue contents are discarded; nothing is persisted.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        self.cancel.cancel();
        self.tasks.close();
        if tokio::time::timeout(self.config.drain_timeout, self.tasks.wait()).await.is_err() {
            warn!(
                timeout_ms = self.config.drain_timeout.as_millis() as u64,
                "drain timed out, abandoning in-flight connections"
            );
        }

        let stats = self.queue.stats();
        info!(
            ready = stats.ready,
            leased = stats.leased,
            next_id = ?stats.next_id,
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
