// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use tw_core::{DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_VISIBILITY_TIMEOUT};
use tw_wire::IdWidth;

use crate::lifecycle::LifecycleError;

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8294";

fn millis(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Listen address (`TW_ADDR`)
pub fn addr() -> String {
    std::env::var("TW_ADDR")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

/// How long a lease hides a job (default 30s, `TW_VISIBILITY_TIMEOUT_MS`)
pub fn visibility_timeout() -> Duration {
    millis("TW_VISIBILITY_TIMEOUT_MS").unwrap_or(DEFAULT_VISIBILITY_TIMEOUT)
}

/// Period of the expired-lease sweep (default 5s, `TW_REAPER_INTERVAL_MS`)
pub fn reaper_interval() -> Duration {
    millis("TW_REAPER_INTERVAL_MS").unwrap_or(Duration::from_secs(5))
}

/// Largest accepted SUBMIT payload (default 1 MiB, `TW_MAX_PAYLOAD_BYTES`)
pub fn max_payload_bytes() -> usize {
    std::env::var("TW_MAX_PAYLOAD_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES)
}

/// Per-connection read/write timeout (default 5s, `TW_IPC_TIMEOUT_MS`)
pub fn ipc_timeout() -> Duration {
    millis("TW_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Shutdown drain timeout (default 5s, `TW_DRAIN_TIMEOUT_MS`)
pub fn drain_timeout() -> Duration {
    millis("TW_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Width of the id in SUBMIT responses (`TW_SUBMIT_ID_WIDTH`, 4 or 8).
///
/// An unparseable value is an error, not a fallback to the default.
pub fn submit_id_width() -> Result<IdWidth, LifecycleError> {
    match std::env::var("TW_SUBMIT_ID_WIDTH") {
        Ok(s) => s
            .parse()
            .map_err(|e| LifecycleError::InvalidConfig(format!("TW_SUBMIT_ID_WIDTH: {e}"))),
        Err(_) => Ok(IdWidth::default()),
    }
}

/// Directory for `twd.log`. Logs go to stderr when unset.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("TW_LOG_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}
